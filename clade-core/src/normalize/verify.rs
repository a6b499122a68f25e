//! Final invariant sweep before the store is handed off.
//!
//! Downstream storage carries non-null constraints, so anything that would
//! violate them is fatal here rather than a flagged issue. Everything else
//! found by the sweep lands in the usage diagnostics as usual.

use clade_graph::{Labels, NodeId};

use crate::error::{CladeError, NormalizationError, Result};
use crate::store::GraphStore;
use crate::types::{Issue, Origin};
use crate::validate;

/// Check every stored usage, patching what can be patched. Returns the
/// number of usages checked.
pub fn verify(store: &mut GraphStore, batch_size: usize) -> Result<u64> {
    store.process(Labels::ALL, batch_size, |store, id| {
        let mut usage = store.get(id)?;
        let before = usage.clone();

        let origin = usage
            .name
            .origin
            .ok_or_else(|| missing(id, "name origin"))?;
        if origin == Origin::Source {
            let key = usage
                .verbatim_key
                .ok_or_else(|| missing(id, "verbatim key"))?;
            if usage.taxon_id.is_none() {
                return Err(missing(id, "taxon identifier"));
            }
            if store.get_verbatim(key)?.is_some_and(|r| r.unescaped) {
                usage.diagnostics.flag(Issue::EscapedCharacters);
            }
        } else if usage.taxon_id.is_none() {
            // engine-created usages get a synthesized diagnostic id
            let rank = usage.name.rank.map(|r| r.as_str()).unwrap_or("unranked");
            let name = usage.name.scientific_name.as_deref().unwrap_or("?");
            usage.taxon_id = Some(format!("{origin} {rank} {name}"));
        }

        usage.diagnostics.merge(validate::flag_issues(&usage.name));

        if usage
            .name
            .scientific_name
            .as_deref()
            .is_none_or(str::is_empty)
        {
            return Err(missing(id, "scientific name"));
        }
        if usage.name.rank.is_none() {
            return Err(missing(id, "rank"));
        }
        if usage.name.name_type.is_none() {
            return Err(missing(id, "name type"));
        }
        if !usage.is_synonym() {
            if usage.status.is_none() {
                return Err(missing(id, "taxonomic status"));
            }
            if usage.origin.is_none() {
                return Err(missing(id, "usage origin"));
            }
        }
        for vernacular in &usage.vernacular_names {
            if vernacular.name.as_deref().is_none_or(str::is_empty) {
                return Err(missing(id, "vernacular name"));
            }
        }
        for distribution in &usage.distributions {
            if distribution.gazetteer.as_deref().is_none_or(str::is_empty) {
                return Err(missing(id, "distribution gazetteer"));
            }
            if distribution.area.as_deref().is_none_or(str::is_empty) {
                return Err(missing(id, "distribution area"));
            }
        }

        if usage != before {
            store.put(id, &usage)?;
        }
        Ok(())
    })
}

fn missing(node: NodeId, what: &str) -> CladeError {
    NormalizationError::MissingData {
        node,
        what: what.to_string(),
    }
    .into()
}
