//! Per-node summarization waterfall.
//!
//! Every node goes through the same decision chain: the database already
//! has a fresh artifact (`Unchanged`), the cache can restore it
//! (`Restored`), or the LLM regenerates it (`Regenerated`). Freshness is
//! keyed on a content hash for method bodies and on the per-run change log
//! of dependencies for everything else. When the assembled context does not
//! fit the model's window, regeneration falls back to iterative folding: a
//! running summary refined once per context chunk.

use std::sync::Arc;

use ai_llm_service::LlmService;
use md5::{Digest, Md5};
use tracing::info;

use crate::cache::SummaryCache;
use crate::errors::SummaryError;
use crate::prompts::{self, HierarchicalKind, MethodRelation, TypeRelation};
use crate::tokens::TokenBudget;

/// Which branch of the waterfall produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unchanged,
    Restored,
    Regenerated,
}

/// Artifacts produced for one node.
#[derive(Debug, Clone)]
pub struct Processed {
    pub id: String,
    pub status: Status,
    pub summary: Option<String>,
    pub code_analysis: Option<String>,
    pub code_hash: Option<String>,
}

impl Processed {
    fn with_summary(id: &str, status: Status, summary: String) -> Self {
        Self {
            id: id.to_string(),
            status,
            summary: Some(summary),
            code_analysis: None,
            code_hash: None,
        }
    }

    fn with_analysis(id: &str, status: Status, analysis: String, hash: String) -> Self {
        Self {
            id: id.to_string(),
            status,
            summary: None,
            code_analysis: Some(analysis),
            code_hash: Some(hash),
        }
    }
}

/// Input for method code analysis.
#[derive(Debug, Clone)]
pub struct MethodAnalysisItem {
    pub id: String,
    pub source_code: Option<String>,
    pub db_analysis: Option<String>,
    pub db_hash: Option<String>,
}

/// Input for a method's contextual summary.
#[derive(Debug, Clone)]
pub struct MethodSummaryItem {
    pub id: String,
    pub name: String,
    pub db_summary: Option<String>,
    /// Entity ids of methods invoking this one.
    pub callers: Vec<String>,
    /// Entity ids of methods this one invokes.
    pub callees: Vec<String>,
}

/// Input for a type's summary.
#[derive(Debug, Clone)]
pub struct TypeSummaryItem {
    pub id: String,
    pub name: String,
    /// Refinement label shown in prompts (Class, Interface, Enum, Record).
    pub label: String,
    pub db_summary: Option<String>,
    pub parent_ids: Vec<String>,
    pub member_ids: Vec<String>,
}

/// Input for a container node's summary (source file, directory, project).
#[derive(Debug, Clone)]
pub struct HierarchicalItem {
    pub id: String,
    pub name: String,
    pub db_summary: Option<String>,
    pub dependency_ids: Vec<String>,
}

/// Stateless decision layer; owns no graph access. Shared by all workers
/// of a pass.
pub struct NodeProcessor {
    llm: Arc<LlmService>,
    cache: Arc<SummaryCache>,
    tokens: TokenBudget,
}

impl NodeProcessor {
    pub fn new(llm: Arc<LlmService>, cache: Arc<SummaryCache>, tokens: TokenBudget) -> Self {
        Self { llm, cache, tokens }
    }

    pub fn cache(&self) -> &Arc<SummaryCache> {
        &self.cache
    }

    /// md5 of a method body, the freshness key for its analysis.
    pub fn code_hash(source: &str) -> String {
        format!("{:x}", Md5::digest(source.as_bytes()))
    }

    /* --------------------- Method code analysis --------------------- */

    /// Analyzes one method body, honoring the content hash.
    pub async fn method_code_analysis(
        &self,
        item: &MethodAnalysisItem,
    ) -> Result<Option<Processed>, SummaryError> {
        let Some(source) = item.source_code.as_deref() else {
            return Ok(None);
        };
        let new_hash = Self::code_hash(source);

        // 1. DB state: perfect hit.
        if let (Some(db_analysis), Some(db_hash)) = (&item.db_analysis, &item.db_hash) {
            if *db_hash == new_hash {
                return Ok(Some(Processed::with_analysis(
                    &item.id,
                    Status::Unchanged,
                    db_analysis.clone(),
                    new_hash,
                )));
            }
        }

        // 2. Cache state: restorable.
        let cached = self.cache.entry(&item.id);
        if cached.code_hash.as_deref() == Some(new_hash.as_str()) {
            if let Some(analysis) = cached.code_analysis {
                return Ok(Some(Processed::with_analysis(
                    &item.id,
                    Status::Restored,
                    analysis,
                    new_hash,
                )));
            }
        }

        // 3. Regenerate.
        let analysis = self.analyze_code_iteratively(source).await?;
        Ok(Some(Processed::with_analysis(
            &item.id,
            Status::Regenerated,
            analysis,
            new_hash,
        )))
    }

    async fn analyze_code_iteratively(&self, source: &str) -> Result<String, SummaryError> {
        let token_count = self.tokens.count(source);
        let chunks = if token_count <= self.tokens.max_context() {
            vec![source.to_string()]
        } else {
            info!(tokens = token_count, "method body exceeds context window; chunking");
            self.tokens.chunk_text(source)?
        };

        let mut running_summary = String::new();
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.iter().enumerate() {
            let prompt = prompts::method_analysis(chunk, i == 0, i == last, &running_summary);
            running_summary = self.llm.generate_summary(&prompt).await?;
        }
        Ok(running_summary)
    }

    /* --------------------- Method summary --------------------- */

    /// Summarizes a method's role from its analysis and call neighbors.
    pub async fn method_summary(
        &self,
        item: &MethodSummaryItem,
    ) -> Result<Option<Processed>, SummaryError> {
        // The method's own analysis being regenerated is what invalidates
        // its summary.
        let stale = self.cache.was_dependency_changed([item.id.as_str()]);

        if let Some(db_summary) = &item.db_summary {
            if !stale {
                return Ok(Some(Processed::with_summary(
                    &item.id,
                    Status::Unchanged,
                    db_summary.clone(),
                )));
            }
        }

        let cached = self.cache.entry(&item.id);
        if let Some(summary) = cached.summary {
            if !stale {
                return Ok(Some(Processed::with_summary(&item.id, Status::Restored, summary)));
            }
        }

        let Some(code_analysis) = cached.code_analysis else {
            return Ok(None); // cannot summarize without an analysis
        };

        let caller_summaries = self.resolve_summaries(&item.callers);
        let callee_summaries = self.resolve_summaries(&item.callees);

        let mut full_context = code_analysis.clone();
        for s in caller_summaries.iter().chain(&callee_summaries) {
            full_context.push(' ');
            full_context.push_str(s);
        }

        let summary = if self.tokens.count(&full_context) < self.tokens.max_context() {
            let prompt = prompts::method_summary(
                &item.name,
                &code_analysis,
                &caller_summaries,
                &callee_summaries,
            );
            self.llm.generate_summary(&prompt).await?
        } else {
            info!(method = %item.name, "method context exceeds window; folding iteratively");
            self.fold_method_context(&code_analysis, &caller_summaries, &callee_summaries)
                .await?
        };

        Ok(Some(Processed::with_summary(&item.id, Status::Regenerated, summary)))
    }

    async fn fold_method_context(
        &self,
        code_analysis: &str,
        caller_summaries: &[String],
        callee_summaries: &[String],
    ) -> Result<String, SummaryError> {
        let mut running_summary = code_analysis.to_string();

        for chunk in self.tokens.chunk_summaries(caller_summaries) {
            let prompt = prompts::iterative_method_summary(
                &running_summary,
                &chunk,
                MethodRelation::Callers,
            );
            running_summary = self.llm.generate_summary(&prompt).await?;
        }
        for chunk in self.tokens.chunk_summaries(callee_summaries) {
            let prompt = prompts::iterative_method_summary(
                &running_summary,
                &chunk,
                MethodRelation::Callees,
            );
            running_summary = self.llm.generate_summary(&prompt).await?;
        }
        Ok(running_summary)
    }

    /* --------------------- Type summary --------------------- */

    /// Summarizes a type from its parents and members.
    pub async fn type_summary(
        &self,
        item: &TypeSummaryItem,
    ) -> Result<Option<Processed>, SummaryError> {
        let stale = self
            .cache
            .was_dependency_changed(item.parent_ids.iter().chain(&item.member_ids));

        if let Some(db_summary) = &item.db_summary {
            if !stale {
                return Ok(Some(Processed::with_summary(
                    &item.id,
                    Status::Unchanged,
                    db_summary.clone(),
                )));
            }
        }

        if let Some(summary) = self.cache.entry(&item.id).summary {
            if !stale {
                return Ok(Some(Processed::with_summary(&item.id, Status::Restored, summary)));
            }
        }

        let parent_summaries = self.resolve_summaries(&item.parent_ids);
        let member_summaries = self.resolve_summaries(&item.member_ids);

        let full_context = parent_summaries
            .iter()
            .chain(&member_summaries)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");

        let summary = if self.tokens.count(&full_context) < self.tokens.max_context() {
            let prompt = prompts::type_summary(
                &item.name,
                &item.label,
                &parent_summaries,
                &member_summaries,
            );
            self.llm.generate_summary(&prompt).await?
        } else {
            info!(type_name = %item.name, "type context exceeds window; folding iteratively");
            self.fold_type_context(item, &parent_summaries, &member_summaries)
                .await?
        };

        Ok(Some(Processed::with_summary(&item.id, Status::Regenerated, summary)))
    }

    async fn fold_type_context(
        &self,
        item: &TypeSummaryItem,
        parent_summaries: &[String],
        member_summaries: &[String],
    ) -> Result<String, SummaryError> {
        let mut running_summary = prompts::type_summary_seed(&item.name, &item.label);

        for chunk in self.tokens.chunk_summaries(parent_summaries) {
            let prompt = prompts::iterative_type_summary(
                &item.name,
                &item.label,
                &running_summary,
                &chunk,
                TypeRelation::Parents,
            );
            running_summary = self.llm.generate_summary(&prompt).await?;
        }
        for chunk in self.tokens.chunk_summaries(member_summaries) {
            let prompt = prompts::iterative_type_summary(
                &item.name,
                &item.label,
                &running_summary,
                &chunk,
                TypeRelation::Members,
            );
            running_summary = self.llm.generate_summary(&prompt).await?;
        }
        Ok(running_summary)
    }

    /* --------------------- Hierarchical summary --------------------- */

    /// Summarizes a container node from its children's summaries. Nodes
    /// with no summarized children are skipped.
    pub async fn hierarchical_summary(
        &self,
        item: &HierarchicalItem,
        kind: HierarchicalKind,
    ) -> Result<Option<Processed>, SummaryError> {
        let stale = self.cache.was_dependency_changed(&item.dependency_ids);

        if let Some(db_summary) = &item.db_summary {
            if !stale {
                return Ok(Some(Processed::with_summary(
                    &item.id,
                    Status::Unchanged,
                    db_summary.clone(),
                )));
            }
        }

        if let Some(summary) = self.cache.entry(&item.id).summary {
            if !stale {
                return Ok(Some(Processed::with_summary(&item.id, Status::Restored, summary)));
            }
        }

        let child_summaries = self.resolve_summaries(&item.dependency_ids);
        if child_summaries.is_empty() {
            return Ok(None); // nothing to summarize from
        }

        let full_context = child_summaries.join(" ");
        let summary = if self.tokens.count(&full_context) < self.tokens.max_context() {
            let context = child_summaries.join("; ");
            let prompt = prompts::hierarchical_summary(kind, &item.name, &context);
            self.llm.generate_summary(&prompt).await?
        } else {
            info!(node = %item.name, kind = kind.label(), "context exceeds window; folding iteratively");
            let mut running_summary = prompts::hierarchical_summary_seed(kind, &item.name);
            for chunk in self.tokens.chunk_summaries(&child_summaries) {
                let prompt = prompts::iterative_hierarchical_summary(
                    kind,
                    &item.name,
                    &running_summary,
                    &chunk,
                );
                running_summary = self.llm.generate_summary(&prompt).await?;
            }
            running_summary
        };

        Ok(Some(Processed::with_summary(&item.id, Status::Regenerated, summary)))
    }

    /// Dependency summaries as currently cached; unsummarized dependencies
    /// simply contribute nothing.
    fn resolve_summaries(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.cache.entry(id).summary)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheOptions};
    use ai_llm_service::services::fake_service::FakeService;
    use tempfile::TempDir;

    fn processor(dir: &TempDir, max_context: usize) -> NodeProcessor {
        let llm = Arc::new(LlmService::Fake(FakeService));
        let cache = Arc::new(SummaryCache::new(dir.path(), CacheOptions::default()).unwrap());
        NodeProcessor::new(llm, cache, TokenBudget::new(max_context).unwrap())
    }

    fn analysis_item(id: &str, source: &str) -> MethodAnalysisItem {
        MethodAnalysisItem {
            id: id.to_string(),
            source_code: Some(source.to_string()),
            db_analysis: None,
            db_hash: None,
        }
    }

    #[tokio::test]
    async fn analysis_db_hit_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);

        let source = "void run() {}";
        let item = MethodAnalysisItem {
            db_analysis: Some("existing".to_string()),
            db_hash: Some(NodeProcessor::code_hash(source)),
            ..analysis_item("m1", source)
        };

        let out = p.method_code_analysis(&item).await.unwrap().unwrap();
        assert_eq!(out.status, Status::Unchanged);
        assert_eq!(out.code_analysis.as_deref(), Some("existing"));
    }

    #[tokio::test]
    async fn analysis_cache_hit_is_restored() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);

        let source = "void run() {}";
        p.cache().update(
            "m1",
            CacheEntry {
                code_analysis: Some("from cache".to_string()),
                code_hash: Some(NodeProcessor::code_hash(source)),
                ..Default::default()
            },
        );

        let out = p
            .method_code_analysis(&analysis_item("m1", source))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.status, Status::Restored);
        assert_eq!(out.code_analysis.as_deref(), Some("from cache"));
    }

    #[tokio::test]
    async fn analysis_miss_regenerates() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);

        let out = p
            .method_code_analysis(&analysis_item("m1", "void run() {}"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.status, Status::Regenerated);
        assert!(out.code_analysis.is_some());
        assert_eq!(out.code_hash.as_deref(), Some(NodeProcessor::code_hash("void run() {}").as_str()));
    }

    #[tokio::test]
    async fn changed_hash_beats_stale_db_artifact() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);

        let item = MethodAnalysisItem {
            db_analysis: Some("stale".to_string()),
            db_hash: Some("0000".to_string()),
            ..analysis_item("m1", "void run() { updated(); }")
        };
        let out = p.method_code_analysis(&item).await.unwrap().unwrap();
        assert_eq!(out.status, Status::Regenerated);
    }

    // A changed dependency must push the waterfall to regeneration even
    // when the database already carries a summary.
    #[tokio::test]
    async fn stale_dependency_forces_regeneration() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);
        p.cache().mark_regenerated("member-1");

        let item = TypeSummaryItem {
            id: "t1".to_string(),
            name: "Engine".to_string(),
            label: "Class".to_string(),
            db_summary: Some("old summary".to_string()),
            parent_ids: vec![],
            member_ids: vec!["member-1".to_string()],
        };
        let out = p.type_summary(&item).await.unwrap().unwrap();
        assert_eq!(out.status, Status::Regenerated);
    }

    #[tokio::test]
    async fn fresh_db_summary_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);

        let item = TypeSummaryItem {
            id: "t1".to_string(),
            name: "Engine".to_string(),
            label: "Class".to_string(),
            db_summary: Some("still good".to_string()),
            parent_ids: vec!["p1".to_string()],
            member_ids: vec![],
        };
        let out = p.type_summary(&item).await.unwrap().unwrap();
        assert_eq!(out.status, Status::Unchanged);
        assert_eq!(out.summary.as_deref(), Some("still good"));
    }

    #[tokio::test]
    async fn method_summary_needs_analysis() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);

        let item = MethodSummaryItem {
            id: "m1".to_string(),
            name: "run".to_string(),
            db_summary: None,
            callers: vec![],
            callees: vec![],
        };
        assert!(p.method_summary(&item).await.unwrap().is_none());
    }

    // Oversize context falls back to iterative folding and still produces
    // a single non-empty summary.
    #[tokio::test]
    async fn oversize_context_folds_iteratively() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 64);

        p.cache().update(
            "m1",
            CacheEntry { code_analysis: Some("computes a value".to_string()), ..Default::default() },
        );
        let callees: Vec<String> = (0..50).map(|i| format!("callee-{i}")).collect();
        for id in &callees {
            p.cache().update(
                id,
                CacheEntry {
                    summary: Some(format!("performs subtask {id} with a long description")),
                    ..Default::default()
                },
            );
        }

        let item = MethodSummaryItem {
            id: "m1".to_string(),
            name: "run".to_string(),
            db_summary: None,
            callers: vec![],
            callees,
        };
        let out = p.method_summary(&item).await.unwrap().unwrap();
        assert_eq!(out.status, Status::Regenerated);
        assert!(!out.summary.unwrap().trim().is_empty());
    }

    #[tokio::test]
    async fn hierarchical_without_children_is_skipped() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);

        let item = HierarchicalItem {
            id: "d1".to_string(),
            name: "/src/util".to_string(),
            db_summary: None,
            dependency_ids: vec!["missing-child".to_string()],
        };
        let out = p
            .hierarchical_summary(&item, HierarchicalKind::Directory)
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn hierarchical_regenerates_from_children() {
        let dir = TempDir::new().unwrap();
        let p = processor(&dir, 8192);
        p.cache().update(
            "child-1",
            CacheEntry { summary: Some("reads config".to_string()), ..Default::default() },
        );

        let item = HierarchicalItem {
            id: "d1".to_string(),
            name: "/src/util".to_string(),
            db_summary: None,
            dependency_ids: vec!["child-1".to_string()],
        };
        let out = p
            .hierarchical_summary(&item, HierarchicalKind::Directory)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.status, Status::Regenerated);
    }
}
