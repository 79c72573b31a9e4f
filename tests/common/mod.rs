//! Behaviour every `Repository` implementation must show.
//!
//! Each check starts from an empty store and is run against both the
//! in-memory store and PostgreSQL.

#![allow(dead_code)]

use ticketboard::TicketboardError;
use ticketboard::core::{
    CommentBuilder, DeleteMode, ListQuery, NewTodo, Ticket, TicketBuilder, TicketChanges,
    TicketLookup, TicketStatus, TodoChanges, TodoItem, positions,
};
use ticketboard::storage::Repository;

pub async fn create_ticket(repo: &dyn Repository, category: &str, number: &str) -> Ticket {
    repo.create_ticket(
        TicketBuilder::new()
            .category(category)
            .number(number)
            .description(format!("Ticket {number}"))
            .build(),
    )
    .await
    .expect("create ticket")
}

fn describe(description: &str) -> TicketChanges {
    TicketChanges {
        description: Some(description.to_string()),
        ..Default::default()
    }
}

fn assert_dense(todos: &[TodoItem]) {
    let positions: Vec<i32> = todos.iter().map(|t| t.position).collect();
    assert!(positions::is_dense(&positions), "positions are not dense: {positions:?}");
}

fn descriptions(todos: &[TodoItem]) -> Vec<&str> {
    todos.iter().map(|t| t.description.as_str()).collect()
}

pub async fn update_creates_new_version(repo: &dyn Repository) {
    let created = repo
        .create_ticket(
            TicketBuilder::new()
                .category("bug")
                .number("BUG-123")
                .description("Fix login")
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(created.version, 1);
    assert!(created.is_active);
    assert_eq!(created.status, TicketStatus::Todo);

    let lookup = TicketLookup::new("BUG-123").with_category(Some("bug".into()));
    let updated = repo.update_ticket(&lookup, describe("Fix login auth")).await.unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.lineage_id, created.lineage_id);
    assert_eq!(updated.created_at, created.created_at);

    let current = repo.get_ticket(&lookup).await.unwrap();
    assert_eq!(current.description, "Fix login auth");
    assert_eq!(current.version, 2);

    let history = repo.ticket_history(&lookup).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[0].is_active);
    assert!(history[0].valid_to.is_some());
    assert!(history[1].is_active);
    assert_eq!(history[1].valid_to, None);
}

pub async fn single_active_version(repo: &dyn Repository) {
    create_ticket(repo, "ops", "OPS-1").await;
    let lookup = TicketLookup::new("OPS-1");
    repo.update_ticket(&lookup, describe("second")).await.unwrap();
    repo.update_ticket(
        &lookup,
        TicketChanges {
            status: Some(TicketStatus::Doing),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let history = repo.ticket_history(&lookup).await.unwrap();
    let versions: Vec<i32> = history.iter().map(|t| t.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert_eq!(history.iter().filter(|t| t.is_active).count(), 1);
    assert_eq!(history[2].status, TicketStatus::Doing);
    assert_eq!(history[2].description, "second");
}

pub async fn duplicate_create_conflicts(repo: &dyn Repository) {
    create_ticket(repo, "bug", "BUG-1").await;
    let err = repo
        .create_ticket(
            TicketBuilder::new()
                .category("bug")
                .number("BUG-1")
                .description("again")
                .build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TicketboardError::Conflict(_)), "{err:?}");
}

pub async fn generated_numbers(repo: &dyn Repository) {
    let ticket = repo
        .create_ticket(TicketBuilder::new().category("feature").description("Saved filters").build())
        .await
        .unwrap();
    assert!(ticket.ticket_number.starts_with("FEA-"), "{}", ticket.ticket_number);
}

pub async fn unchanged_update_keeps_version(repo: &dyn Repository) {
    create_ticket(repo, "bug", "BUG-2").await;
    let lookup = TicketLookup::new("BUG-2");

    let same = repo.update_ticket(&lookup, describe("Ticket BUG-2")).await.unwrap();
    assert_eq!(same.version, 1);
    assert_eq!(repo.ticket_history(&lookup).await.unwrap().len(), 1);

    let err = repo.update_ticket(&lookup, TicketChanges::default()).await.unwrap_err();
    assert!(matches!(err, TicketboardError::Validation(_)));
}

pub async fn soft_delete_then_recreate(repo: &dyn Repository) {
    let first = create_ticket(repo, "bug", "BUG-3").await;
    let lookup = TicketLookup::new("BUG-3");
    repo.create_todo(&lookup, NewTodo::new("old work")).await.unwrap();

    repo.delete_ticket(&lookup, DeleteMode::Soft).await.unwrap();
    // Deleting an inactive ticket is a no-op
    repo.delete_ticket(&lookup, DeleteMode::Soft).await.unwrap();

    assert!(matches!(
        repo.get_ticket(&lookup).await,
        Err(TicketboardError::TicketNotFound { .. })
    ));
    assert!(matches!(
        repo.list_todos(&lookup).await,
        Err(TicketboardError::TicketNotFound { .. })
    ));
    let history = repo.ticket_history(&lookup).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_active);

    let second = create_ticket(repo, "bug", "BUG-3").await;
    assert_eq!(second.version, 1);
    assert_ne!(second.lineage_id, first.lineage_id);
    assert!(repo.list_todos(&lookup).await.unwrap().is_empty());

    let history = repo.ticket_history(&lookup).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].lineage_id, second.lineage_id);
}

pub async fn delete_unknown_ticket(repo: &dyn Repository) {
    let lookup = TicketLookup::new("NOPE-1");
    for mode in [DeleteMode::Soft, DeleteMode::Hard] {
        assert!(matches!(
            repo.delete_ticket(&lookup, mode).await,
            Err(TicketboardError::TicketNotFound { .. })
        ));
    }
}

pub async fn hard_delete_removes_everything(repo: &dyn Repository) {
    create_ticket(repo, "bug", "BUG-4").await;
    let lookup = TicketLookup::new("BUG-4");
    let todo = repo.create_todo(&lookup, NewTodo::new("reproduce")).await.unwrap();
    let comment = repo
        .create_comment(&lookup, CommentBuilder::new().author("alice").content("seen it").build())
        .await
        .unwrap();
    repo.update_ticket(&lookup, describe("updated")).await.unwrap();

    repo.delete_ticket(&lookup, DeleteMode::Hard).await.unwrap();

    assert!(matches!(
        repo.get_ticket(&lookup).await,
        Err(TicketboardError::TicketNotFound { .. })
    ));
    assert!(matches!(
        repo.ticket_history(&lookup).await,
        Err(TicketboardError::TicketNotFound { .. })
    ));
    assert!(matches!(
        repo.delete_todo(todo.id).await,
        Err(TicketboardError::TodoNotFound { .. })
    ));
    assert!(matches!(
        repo.delete_comment(comment.id).await,
        Err(TicketboardError::CommentNotFound { .. })
    ));
}

pub async fn todo_positions_stay_dense(repo: &dyn Repository) {
    create_ticket(repo, "bug", "BUG-5").await;
    let lookup = TicketLookup::new("BUG-5");

    let a = repo.create_todo(&lookup, NewTodo::new("a")).await.unwrap();
    repo.create_todo(&lookup, NewTodo::new("b")).await.unwrap();
    repo.create_todo(&lookup, NewTodo::new("front").at(0)).await.unwrap();
    repo.create_todo(&lookup, NewTodo::new("end").at(99)).await.unwrap();

    let todos = repo.list_todos(&lookup).await.unwrap();
    assert_eq!(descriptions(&todos), vec!["front", "a", "b", "end"]);
    assert_dense(&todos);

    let moved = repo
        .update_todo(
            a.id,
            TodoChanges {
                position: Some(3),
                done: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.position, 3);
    assert!(moved.done);

    let todos = repo.list_todos(&lookup).await.unwrap();
    assert_eq!(descriptions(&todos), vec!["front", "b", "end", "a"]);
    assert_dense(&todos);

    repo.delete_todo(todos[1].id).await.unwrap();
    let todos = repo.list_todos(&lookup).await.unwrap();
    assert_eq!(descriptions(&todos), vec!["front", "end", "a"]);
    assert_dense(&todos);

    let err = repo.create_todo(&lookup, NewTodo::new("neg").at(-1)).await.unwrap_err();
    assert!(matches!(err, TicketboardError::Validation(_)));
}

pub async fn children_follow_new_versions(repo: &dyn Repository) {
    create_ticket(repo, "bug", "BUG-6").await;
    let lookup = TicketLookup::new("BUG-6");
    repo.create_todo(&lookup, NewTodo::new("keep me")).await.unwrap();
    repo.create_comment(&lookup, CommentBuilder::new().author("bob").content("first").build())
        .await
        .unwrap();

    repo.update_ticket(&lookup, describe("v2")).await.unwrap();

    assert_eq!(repo.list_todos(&lookup).await.unwrap().len(), 1);
    assert_eq!(repo.list_comments(&lookup).await.unwrap().len(), 1);
}

pub async fn comments_lifecycle(repo: &dyn Repository) {
    create_ticket(repo, "bug", "BUG-7").await;
    let lookup = TicketLookup::new("BUG-7");

    let first = repo
        .create_comment(&lookup, CommentBuilder::new().author("alice").content("one").build())
        .await
        .unwrap();
    let second = repo
        .create_comment(
            &lookup,
            CommentBuilder::new()
                .author("bob")
                .content("two")
                .links(serde_json::json!(["https://example.com/pr/7"]))
                .build(),
        )
        .await
        .unwrap();

    let comments = repo.list_comments(&lookup).await.unwrap();
    let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(comments[1].links, Some(serde_json::json!(["https://example.com/pr/7"])));

    let edited = repo
        .update_comment(first.id, CommentBuilder::new().content("one, edited").build_changes())
        .await
        .unwrap();
    assert_eq!(edited.content, "one, edited");
    assert_eq!(edited.author, "alice");

    repo.delete_comment(second.id).await.unwrap();
    assert_eq!(repo.list_comments(&lookup).await.unwrap().len(), 1);

    let err = repo
        .create_comment(&lookup, CommentBuilder::new().author("").content("anon").build())
        .await
        .unwrap_err();
    assert!(matches!(err, TicketboardError::Validation(_)));
}

pub async fn ambiguous_number_needs_category(repo: &dyn Repository) {
    create_ticket(repo, "bug", "X-1").await;
    create_ticket(repo, "feature", "X-1").await;

    let err = repo.get_ticket(&TicketLookup::new("X-1")).await.unwrap_err();
    assert!(matches!(err, TicketboardError::Validation(_)));

    let feature = repo
        .get_ticket(&TicketLookup::new("X-1").with_category(Some("feature".into())))
        .await
        .unwrap();
    assert_eq!(feature.ticket_category, "feature");
}

pub async fn list_filters_and_pages(repo: &dyn Repository) {
    for number in ["L-1", "L-2", "L-3"] {
        create_ticket(repo, "bug", number).await;
    }
    create_ticket(repo, "docs", "D-1").await;
    repo.delete_ticket(&TicketLookup::new("L-1"), DeleteMode::Soft).await.unwrap();

    let page = repo
        .list_tickets(&ListQuery {
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.tickets.len(), 2);
    assert!(page.tickets.iter().all(|t| t.is_active));

    let bugs = repo
        .list_tickets(&ListQuery {
            category: Some("bug".into()),
            active_only: false,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(bugs.total, 3);
    assert!(bugs.tickets.iter().all(|t| t.ticket_category == "bug"));

    let rest = repo
        .list_tickets(&ListQuery {
            offset: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rest.tickets.len(), 1);
}

pub async fn children_need_active_ticket(repo: &dyn Repository) {
    assert!(matches!(
        repo.create_todo(&TicketLookup::new("MISSING"), NewTodo::new("x")).await,
        Err(TicketboardError::TicketNotFound { .. })
    ));
    assert!(matches!(
        repo.update_todo(
            404,
            TodoChanges {
                done: Some(true),
                ..Default::default()
            }
        )
        .await,
        Err(TicketboardError::TodoNotFound { id: 404 })
    ));
}
