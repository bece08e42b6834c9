use libris_server::{
    config::DeletePolicy,
    error::AppError,
    models::{
        book::{BookDetails, NewBook},
        member::{MemberDetails, NewMember},
    },
};

use crate::common::{add_book, add_member, assert_consistent, test_state};

#[tokio::test]
async fn test_ids_start_at_one_per_collection() {
    let state = test_state(DeletePolicy::Block).await;

    assert_eq!(add_book(&state, "Dune", "Frank Herbert").await, 1);
    assert_eq!(add_member(&state, "Alice", "1 Main St").await, 1);
    assert_eq!(add_book(&state, "Emma", "Jane Austen").await, 2);

    let book = state.services.catalog.get_book(1).await.unwrap();
    assert_eq!(book.title, "Dune");
    assert!(!book.borrow_status);
    assert_eq!(book.issued_to, None);

    let member = state.services.catalog.get_member(1).await.unwrap();
    assert_eq!(member.name, "Alice");
    assert!(member.borrowed_books.is_empty());
}

#[tokio::test]
async fn test_add_book_round_trips_optional_fields() {
    let state = test_state(DeletePolicy::Block).await;

    let id = state
        .services
        .catalog
        .add_book(
            NewBook::new("  Dune ", "Frank Herbert")
                .with_isbn("9780441013593")
                .with_genre("   ")
                .with_cover_url("https://covers.example/dune.jpg"),
            None,
        )
        .await
        .unwrap();

    let book = state.services.catalog.get_book(id).await.unwrap();
    assert_eq!(book.title, "Dune");
    assert_eq!(book.isbn.as_deref(), Some("9780441013593"));
    assert_eq!(book.genre, None);
    assert_eq!(book.cover_url.as_deref(), Some("https://covers.example/dune.jpg"));
}

#[tokio::test]
async fn test_add_rejects_blank_required_fields() {
    let state = test_state(DeletePolicy::Block).await;

    let err = state
        .services
        .catalog
        .add_book(NewBook::new("   ", "Someone"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = state
        .services
        .catalog
        .add_member(NewMember::new("", "Nowhere"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    assert!(state.services.catalog.list_books().await.unwrap().is_empty());
    assert!(state.services.catalog.list_members().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_id_collision_is_duplicate_key() {
    let state = test_state(DeletePolicy::Block).await;

    let id = state
        .services
        .catalog
        .add_book(NewBook::new("Dune", "Frank Herbert"), Some(10))
        .await
        .unwrap();
    assert_eq!(id, 10);

    let err = state
        .services
        .catalog
        .add_book(NewBook::new("Emma", "Jane Austen"), Some(10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(_)));

    let books = state.services.catalog.list_books().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Dune");
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let state = test_state(DeletePolicy::Block).await;

    assert!(matches!(
        state.services.catalog.get_book(99).await,
        Err(AppError::BookNotFound(99))
    ));
    assert!(matches!(
        state.services.catalog.get_member(99).await,
        Err(AppError::MemberNotFound(99))
    ));
    assert!(matches!(
        state.services.catalog.delete_book(99).await,
        Err(AppError::BookNotFound(99))
    ));
    assert!(matches!(
        state.services.catalog.delete_member(99).await,
        Err(AppError::MemberNotFound(99))
    ));
}

#[tokio::test]
async fn test_update_leaves_loan_state_alone() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = add_book(&state, "Dune", "Frank Herbert").await;
    let member_id = add_member(&state, "Alice", "1 Main St").await;
    state.services.loans.issue_book(book_id, member_id).await.unwrap();

    let book = state
        .services
        .catalog
        .update_book(
            book_id,
            BookDetails {
                title: Some("Dune Messiah".to_string()),
                ..BookDetails::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(book.title, "Dune Messiah");
    assert_eq!(book.author, "Frank Herbert");
    assert!(book.borrow_status);
    assert_eq!(book.issued_to, Some(member_id));

    let member = state
        .services
        .catalog
        .update_member(
            member_id,
            MemberDetails {
                address: Some("2 High St".to_string()),
                ..MemberDetails::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(member.name, "Alice");
    assert_eq!(member.address.as_deref(), Some("2 High St"));
    assert!(member.borrowed_books.contains(book_id));

    assert_consistent(&state).await;
}

#[tokio::test]
async fn test_search_books_by_text_and_id() {
    let state = test_state(DeletePolicy::Block).await;
    add_book(&state, "Dune", "Frank Herbert").await;
    add_book(&state, "Emma", "Jane Austen").await;
    add_book(&state, "1984", "George Orwell").await;

    let catalog = &state.services.catalog;

    let found = catalog.search_books("Herbert").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Dune");

    // Case-sensitive
    assert!(catalog.search_books("dune").await.unwrap().is_empty());

    // Digits match the id and digit substrings of text fields
    let found = catalog.search_books("1").await.unwrap();
    let titles: Vec<_> = found.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "1984"]);

    let found = catalog.search_books(2_i64).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Emma");

    assert!(catalog.search_books("Tolkien").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_members_by_text_and_id() {
    let state = test_state(DeletePolicy::Block).await;
    add_member(&state, "Alice", "1 Main St").await;
    add_member(&state, "Bob", "Elm Road").await;

    let catalog = &state.services.catalog;

    let found = catalog.search_members("Elm").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Bob");

    let found = catalog.search_members(2_i64).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Bob");

    assert!(catalog.search_members("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_block_policy_refuses_deleting_loaned_records() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = add_book(&state, "Dune", "Frank Herbert").await;
    let member_id = add_member(&state, "Alice", "1 Main St").await;
    state.services.loans.issue_book(book_id, member_id).await.unwrap();

    let err = state.services.catalog.delete_book(book_id).await.unwrap_err();
    assert!(matches!(err, AppError::BookOnLoan { book_id: 1, member_id: 1 }));

    let err = state.services.catalog.delete_member(member_id).await.unwrap_err();
    assert!(matches!(err, AppError::MemberHasLoans { member_id: 1, count: 1 }));

    // Nothing changed
    assert!(state.services.catalog.get_book(book_id).await.unwrap().borrow_status);
    assert!(state
        .services
        .catalog
        .get_member(member_id)
        .await
        .unwrap()
        .borrowed_books
        .contains(book_id));
    assert_consistent(&state).await;

    state.services.loans.return_book(book_id, None).await.unwrap();
    state.services.catalog.delete_book(book_id).await.unwrap();
    state.services.catalog.delete_member(member_id).await.unwrap();
    assert!(state.services.catalog.list_books().await.unwrap().is_empty());
    assert!(state.services.catalog.list_members().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cascade_policy_returns_books_before_deleting() {
    let state = test_state(DeletePolicy::Cascade).await;
    let dune = add_book(&state, "Dune", "Frank Herbert").await;
    let emma = add_book(&state, "Emma", "Jane Austen").await;
    let alice = add_member(&state, "Alice", "1 Main St").await;
    let bob = add_member(&state, "Bob", "Elm Road").await;

    state.services.loans.issue_book(dune, alice).await.unwrap();
    state.services.loans.issue_book(emma, bob).await.unwrap();

    state.services.catalog.delete_book(dune).await.unwrap();
    let alice_record = state.services.catalog.get_member(alice).await.unwrap();
    assert!(alice_record.borrowed_books.is_empty());
    assert_consistent(&state).await;

    state.services.catalog.delete_member(bob).await.unwrap();
    let emma_record = state.services.catalog.get_book(emma).await.unwrap();
    assert!(!emma_record.borrow_status);
    assert_eq!(emma_record.issued_to, None);
    assert_consistent(&state).await;
}
