use libris_server::{config::DeletePolicy, error::AppError, models::book::NewBook};

use crate::common::{add_book, add_member, assert_consistent, test_state};

#[tokio::test]
async fn test_issue_then_return_scenario() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = state
        .services
        .catalog
        .add_book(NewBook::new("Dune", "Herbert").with_isbn("999"), None)
        .await
        .unwrap();
    let member_id = add_member(&state, "Alice", "X").await;
    assert_eq!((book_id, member_id), (1, 1));
    let before = state.services.catalog.get_book(1).await.unwrap();

    let book = state.services.loans.issue_book(1, 1).await.unwrap();
    assert!(book.borrow_status);
    assert_eq!(book.issued_to, Some(1));
    assert!(book.issued_at.is_some());

    let member = state.services.catalog.get_member(1).await.unwrap();
    assert_eq!(member.borrowed_books.to_vec(), vec![1]);

    let err = state.services.loans.issue_book(1, 1).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyIssued { book_id: 1, member_id: 1 }));
    // Still listed exactly once
    let member = state.services.catalog.get_member(1).await.unwrap();
    assert_eq!(member.borrowed_books.to_vec(), vec![1]);

    let book = state.services.loans.return_book(1, Some(1)).await.unwrap();
    assert!(!book.borrow_status);
    assert_eq!(book.issued_to, None);
    assert_eq!(book.issued_at, None);
    assert_eq!(book, before);

    let member = state.services.catalog.get_member(1).await.unwrap();
    assert!(member.borrowed_books.is_empty());
    assert_consistent(&state).await;
}

#[tokio::test]
async fn test_issue_to_other_member_is_refused() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = add_book(&state, "Dune", "Frank Herbert").await;
    let alice = add_member(&state, "Alice", "1 Main St").await;
    let bob = add_member(&state, "Bob", "Elm Road").await;

    state.services.loans.issue_book(book_id, alice).await.unwrap();
    let err = state.services.loans.issue_book(book_id, bob).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyIssued { member_id, .. } if member_id == alice));

    let bob_record = state.services.catalog.get_member(bob).await.unwrap();
    assert!(bob_record.borrowed_books.is_empty());
    assert_consistent(&state).await;
}

#[tokio::test]
async fn test_issue_unknown_records() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = add_book(&state, "Dune", "Frank Herbert").await;
    let member_id = add_member(&state, "Alice", "1 Main St").await;

    assert!(matches!(
        state.services.loans.issue_book(42, member_id).await,
        Err(AppError::BookNotFound(42))
    ));
    assert!(matches!(
        state.services.loans.issue_book(book_id, 42).await,
        Err(AppError::MemberNotFound(42))
    ));
    assert!(!state.services.catalog.get_book(book_id).await.unwrap().borrow_status);
}

#[tokio::test]
async fn test_return_of_available_book_is_not_issued() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = add_book(&state, "Dune", "Frank Herbert").await;

    let err = state.services.loans.return_book(book_id, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotIssued(id) if id == book_id));
    assert!(matches!(
        state.services.loans.return_book(7, None).await,
        Err(AppError::BookNotFound(7))
    ));
}

#[tokio::test]
async fn test_return_trusts_recorded_holder_over_claim() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = add_book(&state, "Dune", "Frank Herbert").await;
    let alice = add_member(&state, "Alice", "1 Main St").await;
    let bob = add_member(&state, "Bob", "Elm Road").await;

    state.services.loans.issue_book(book_id, alice).await.unwrap();
    state.services.loans.return_book(book_id, Some(bob)).await.unwrap();

    let alice_record = state.services.catalog.get_member(alice).await.unwrap();
    assert!(alice_record.borrowed_books.is_empty());
    assert_consistent(&state).await;
}

#[tokio::test]
async fn test_member_loans_in_issue_order() {
    let state = test_state(DeletePolicy::Block).await;
    let first = add_book(&state, "Dune", "Frank Herbert").await;
    let second = add_book(&state, "Emma", "Jane Austen").await;
    let third = add_book(&state, "Ulysses", "James Joyce").await;
    let alice = add_member(&state, "Alice", "1 Main St").await;

    state.services.loans.issue_book(third, alice).await.unwrap();
    state.services.loans.issue_book(first, alice).await.unwrap();
    state.services.loans.issue_book(second, alice).await.unwrap();
    state.services.loans.return_book(first, None).await.unwrap();

    let loans = state.services.loans.member_loans(alice).await.unwrap();
    let ids: Vec<_> = loans.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![third, second]);
    assert_consistent(&state).await;
}

#[tokio::test]
async fn test_invariants_hold_across_mixed_sequence() {
    let state = test_state(DeletePolicy::Block).await;
    let mut books = Vec::new();
    for i in 0..4 {
        books.push(add_book(&state, &format!("Book {}", i), "Anon").await);
    }
    let alice = add_member(&state, "Alice", "1 Main St").await;
    let bob = add_member(&state, "Bob", "Elm Road").await;

    let steps: [(usize, Option<i64>); 10] = [
        (0, Some(alice)),
        (1, Some(bob)),
        (0, Some(bob)),
        (2, Some(alice)),
        (0, None),
        (0, Some(bob)),
        (3, Some(alice)),
        (1, None),
        (1, None),
        (2, None),
    ];

    for (index, target) in steps {
        let book_id = books[index];
        let _ = match target {
            Some(member_id) => state.services.loans.issue_book(book_id, member_id).await,
            None => state.services.loans.return_book(book_id, None).await,
        };
        assert_consistent(&state).await;
    }

    let alice_loans = state.services.loans.member_loans(alice).await.unwrap();
    let bob_loans = state.services.loans.member_loans(bob).await.unwrap();
    assert_eq!(alice_loans.iter().map(|b| b.id).collect::<Vec<_>>(), vec![books[3]]);
    assert_eq!(bob_loans.iter().map(|b| b.id).collect::<Vec<_>>(), vec![books[0]]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issues_of_one_book() {
    let state = test_state(DeletePolicy::Block).await;
    let book_id = add_book(&state, "Dune", "Frank Herbert").await;
    let mut members = Vec::new();
    for i in 0..8 {
        members.push(add_member(&state, &format!("Member {}", i), "Somewhere").await);
    }

    let mut handles = Vec::new();
    for member_id in members {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            state.services.loans.issue_book(book_id, member_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("issue task panicked") {
            Ok(_) => successes += 1,
            Err(err) => assert!(matches!(err, AppError::AlreadyIssued { .. })),
        }
    }
    assert_eq!(successes, 1);

    let holders: Vec<_> = state
        .services
        .catalog
        .list_members()
        .await
        .unwrap()
        .into_iter()
        .filter(|m| !m.borrowed_books.is_empty())
        .collect();
    assert_eq!(holders.len(), 1);
    assert_consistent(&state).await;
}
