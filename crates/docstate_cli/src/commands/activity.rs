//! Recent-activity commands.

use super::print_json;
use crate::error::CliResult;
use docstate_core::{Category, DerivedState, DocumentId, RecentDocument, SweepReport, UserId};
use serde::Serialize;
use std::path::Path;

/// Response body of `recent`.
#[derive(Debug, Serialize)]
pub struct RecentDocs {
    /// Entries, most recent first.
    pub recent_docs: Vec<RecentDocument>,
}

/// Records an action. View and edit actions also refresh the document's
/// fingerprint when `body` is given.
pub fn record(
    state: &DerivedState,
    user: i64,
    document: i64,
    category: Category,
    body: Option<&Path>,
) -> CliResult<Option<String>> {
    let user = UserId::new(user);
    let document = DocumentId::new(document);
    let events = state.events();

    let body = body.map(std::fs::read).transpose()?;
    let hash = match (category, body) {
        (Category::View, Some(body)) => Some(events.document_viewed(user, document, &body)?),
        (Category::Edit, Some(body)) => Some(events.document_edited(user, document, &body)?),
        (category, _) => {
            events.record(user, category, document)?;
            None
        }
    };
    Ok(hash)
}

/// Runs `record`.
pub fn run_record(
    state: &DerivedState,
    user: i64,
    document: i64,
    category: Category,
    body: Option<&Path>,
) -> CliResult<()> {
    match record(state, user, document, category, body)? {
        Some(hash) => println!("Recorded {category} of document {document} (content {hash})"),
        None => println!("Recorded {category} of document {document}"),
    }
    Ok(())
}

/// Runs `recent`.
pub fn run_recent(
    state: &DerivedState,
    user: i64,
    category: Category,
    start: usize,
    count: usize,
    format: &str,
) -> CliResult<()> {
    let docs = state
        .activity()
        .fetch(UserId::new(user), category, start, count)?;

    if format == "json" {
        return print_json(&RecentDocs { recent_docs: docs });
    }

    if docs.is_empty() {
        println!("No recent {category} activity for user {user}");
        return Ok(());
    }
    println!("{:<12} {:<20} {:<24} {}", "TIMESTAMP", "DOCUMENT", "KNOWLEDGE BASE", "TITLE");
    for doc in &docs {
        println!(
            "{:<12} {:<20} {:<24} {}",
            doc.timestamp, doc.doc_id, doc.kb_name, doc.doc_title
        );
    }
    Ok(())
}

/// Sweeps the lists of `user`, one category or all of them.
pub fn sweep(
    state: &DerivedState,
    user: i64,
    category: Option<Category>,
) -> CliResult<Vec<(Category, SweepReport)>> {
    let user = UserId::new(user);
    let categories = match category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    categories
        .into_iter()
        .map(|category| Ok((category, state.activity().sweep(user, category)?)))
        .collect()
}

/// Runs `sweep`.
pub fn run_sweep(
    state: &DerivedState,
    user: i64,
    category: Option<Category>,
    format: &str,
) -> CliResult<()> {
    let reports = sweep(state, user, category)?;

    if format == "json" {
        #[derive(Serialize)]
        struct Row {
            category: Category,
            #[serde(flatten)]
            report: SweepReport,
        }
        let rows: Vec<Row> = reports
            .into_iter()
            .map(|(category, report)| Row { category, report })
            .collect();
        return print_json(&rows);
    }

    for (category, report) in reports {
        println!(
            "{category}: scanned {}, removed {}, malformed {}",
            report.scanned, report.removed, report.malformed
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstate_core::{Config, DocumentMeta, InMemoryCatalog, KnowledgeBaseId};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state() -> (DerivedState, Arc<InMemoryCatalog>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_knowledge_base(KnowledgeBaseId::new(1), "Engineering");
        for id in 1..=3 {
            catalog.insert(DocumentMeta {
                id: DocumentId::new(id),
                title: format!("Doc {id}"),
                knowledge_base_id: KnowledgeBaseId::new(1),
            });
        }
        let state =
            DerivedState::open_in_memory(Config::new("s"), Arc::clone(&catalog) as _).unwrap();
        (state, catalog)
    }

    #[test]
    fn record_with_body_sets_fingerprint() {
        let (state, _) = state();
        let dir = TempDir::new().unwrap();
        let body = dir.path().join("body.txt");
        std::fs::write(&body, b"abc").unwrap();

        let hash = record(&state, 1, 2, Category::View, Some(&body)).unwrap();
        assert_eq!(
            hash.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(state.fingerprints().get(DocumentId::new(2)).unwrap(), hash.unwrap());
    }

    #[test]
    fn comment_ignores_body() {
        let (state, _) = state();
        assert_eq!(record(&state, 1, 1, Category::Comment, None).unwrap(), None);
        assert_eq!(state.activity().len(UserId::new(1), Category::Comment).unwrap(), 1);
    }

    #[test]
    fn sweep_all_categories() {
        let (state, catalog) = state();
        record(&state, 1, 1, Category::View, None).unwrap();
        record(&state, 1, 2, Category::Edit, None).unwrap();
        catalog.remove(DocumentId::new(2));

        let reports = sweep(&state, 1, None).unwrap();
        assert_eq!(reports.len(), 3);
        let removed: usize = reports.iter().map(|(_, r)| r.removed).sum();
        assert_eq!(removed, 1);
    }

    #[test]
    fn recent_docs_serialize_under_one_key() {
        let body = serde_json::to_value(RecentDocs {
            recent_docs: Vec::new(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "recent_docs": [] }));
    }
}
