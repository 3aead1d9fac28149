use crate::catalog::ReactionTable;
use crate::extract::path::Lookup;
use crate::extract::types::ReactionSummary;
use std::collections::BTreeMap;

/// Builds a post's reaction summary from the UFI summary feedback node
///
/// The total comes from `reaction_count.count` (0 when absent). Each
/// `top_reactions` edge is named by its localized name when present,
/// otherwise through the reaction table.
pub fn post_reactions(feedback: Lookup<'_>, table: &ReactionTable) -> ReactionSummary {
    let total = Some(feedback.at("/reaction_count/count").count_or_zero());
    let detail = collect_detail(feedback.at("/top_reactions/edges"), table, true);
    ReactionSummary { total, detail }
}

/// Builds a comment's reaction summary from its feedback node
///
/// Reaction names are resolved through the table only; identifiers the
/// table does not know are dropped.
pub fn comment_reactions(feedback: Lookup<'_>, table: &ReactionTable) -> ReactionSummary {
    let total = feedback.at("/reactors/count_reduced").count();
    if total.is_none() {
        tracing::debug!("Comment has no reactor count");
    }
    let detail = collect_detail(feedback.at("/top_reactions/edges"), table, false);
    ReactionSummary { total, detail }
}

fn collect_detail(
    edges: Lookup<'_>,
    table: &ReactionTable,
    prefer_localized: bool,
) -> BTreeMap<String, u64> {
    let mut detail = BTreeMap::new();

    for edge in edges.array() {
        let edge = Lookup::new(edge);
        let Some(count) = edge.at("/reaction_count").count() else {
            continue;
        };

        let localized = prefer_localized
            .then(|| edge.at("/node/localized_name").string())
            .flatten();

        let name = localized.or_else(|| {
            let id = edge
                .at("/node/id")
                .str()
                .map(str::to_string)
                .or_else(|| edge.at("/node/id").count().map(|n| n.to_string()))?;
            table.resolve(&id).map(str::to_string)
        });

        match name {
            Some(name) => {
                *detail.entry(name).or_insert(0) += count;
            }
            None => tracing::trace!("Dropping unresolved reaction"),
        }
    }

    detail
}
