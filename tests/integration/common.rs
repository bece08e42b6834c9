use libris_server::{
    api::Dispatcher,
    config::{AppConfig, DatabaseConfig, DeletePolicy},
    models::{book::NewBook, member::NewMember},
    AppState,
};

/// Fresh engine over a private in-memory store
pub async fn test_state(policy: DeletePolicy) -> AppState {
    let mut config = AppConfig::default();
    config.database = DatabaseConfig::in_memory();
    config.catalog.delete_policy = policy;
    AppState::initialize(config)
        .await
        .expect("Failed to initialize in-memory catalog")
}

pub async fn test_dispatcher() -> Dispatcher {
    Dispatcher::new(test_state(DeletePolicy::Block).await)
}

pub async fn add_book(state: &AppState, title: &str, author: &str) -> i64 {
    state
        .services
        .catalog
        .add_book(NewBook::new(title, author), None)
        .await
        .expect("Failed to add book")
}

pub async fn add_member(state: &AppState, name: &str, address: &str) -> i64 {
    state
        .services
        .catalog
        .add_member(NewMember::new(name, address), None)
        .await
        .expect("Failed to add member")
}

/// Check that books and members agree on every loan
pub async fn assert_consistent(state: &AppState) {
    let books = state.services.catalog.list_books().await.unwrap();
    let members = state.services.catalog.list_members().await.unwrap();

    for book in &books {
        match book.issued_to {
            Some(member_id) => {
                assert!(book.borrow_status, "book {} has a holder but is not issued", book.id);
                let holder = members
                    .iter()
                    .find(|m| m.id == member_id)
                    .unwrap_or_else(|| panic!("book {} held by missing member {}", book.id, member_id));
                assert!(
                    holder.borrowed_books.contains(book.id),
                    "member {} does not list book {}",
                    member_id,
                    book.id
                );
            }
            None => assert!(!book.borrow_status, "book {} is issued without a holder", book.id),
        }
    }

    for member in &members {
        for book_id in member.borrowed_books.iter() {
            let book = books
                .iter()
                .find(|b| b.id == book_id)
                .unwrap_or_else(|| panic!("member {} lists missing book {}", member.id, book_id));
            assert_eq!(book.issued_to, Some(member.id));
        }
    }
}
