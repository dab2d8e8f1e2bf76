//! Candidate selection: the union of full-text, substring and trigram hits.

use std::collections::BTreeSet;

use geocol_data::{EntityKind, GeoEntity};
use tracing::{debug, instrument};

use super::SourceError;
use crate::index::{IndexError, NameIndex, TrigramIndex, query_terms, trigram::trigrams};
use crate::query::NormalizedQuery;

/// A row that satisfied at least one match condition, with the raw signals
/// the scorer needs.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub entity: &'a GeoEntity,
    /// Trigram similarity between the folded query and the folded name.
    pub similarity: f64,
    /// Whether the name contains every analyzed query lexeme.
    pub full_text: bool,
    /// Cover-density rank; 0 unless `full_text` holds.
    pub rank: f64,
    /// Whether the folded name contains the folded query.
    pub substring: bool,
}

/// Anything that can produce match candidates for one kind in a single read.
pub trait CandidateSource: Send + Sync {
    fn candidates(
        &self,
        kind: EntityKind,
        query: &NormalizedQuery,
        similarity_threshold: f64,
    ) -> Result<Vec<Candidate<'_>>, SourceError>;
}

/// Run the three match conditions over one table and merge the hits.
///
/// `entities[i]` must be row `i` of both indexes. Candidates come back in
/// ascending row order; the scorer decides the final order.
#[instrument(
    name = "Match Candidates",
    skip_all,
    fields(query = query.folded(), rows = entities.len()),
    level = "debug"
)]
pub fn match_table<'a>(
    entities: &'a [GeoEntity],
    names: &NameIndex,
    trigram_index: &TrigramIndex,
    query: &NormalizedQuery,
    similarity_threshold: f64,
) -> Result<Vec<Candidate<'a>>, IndexError> {
    let folded = query.folded();
    let terms = query_terms(&names.analyze(folded));
    let query_trigrams = trigrams(folded);

    let full_text_rows = names.rows_matching(&terms)?;
    let similar_rows = trigram_index.rows_above(&query_trigrams, similarity_threshold);

    let mut rows: BTreeSet<usize> = full_text_rows.iter().copied().collect();
    rows.extend(similar_rows.iter().map(|(row, _)| *row));
    rows.extend(
        entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.normalized_name().contains(folded))
            .map(|(row, _)| row),
    );

    debug!(
        full_text = full_text_rows.len(),
        trigram = similar_rows.len(),
        total = rows.len(),
        "Candidate rows collected"
    );

    let candidates = rows
        .into_iter()
        .filter_map(|row| {
            let entity = entities.get(row)?;
            let full_text = full_text_rows.binary_search(&row).is_ok();
            Some(Candidate {
                entity,
                similarity: trigram_index.similarity_to(row, &query_trigrams),
                full_text,
                rank: if full_text { names.rank(row, &terms) } else { 0.0 },
                substring: entity.normalized_name().contains(folded),
            })
        })
        .collect();
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::normalize;

    struct Table {
        entities: Vec<GeoEntity>,
        names: NameIndex,
        trigrams: TrigramIndex,
    }

    fn table(names: &[&str]) -> Table {
        let entities: Vec<GeoEntity> = names
            .iter()
            .enumerate()
            .map(|(i, name)| GeoEntity::new(EntityKind::Municipality, i as u32 + 1, *name))
            .collect();
        let folded: Vec<&str> = entities.iter().map(GeoEntity::normalized_name).collect();
        Table {
            names: NameIndex::build(&folded).unwrap(),
            trigrams: TrigramIndex::build(&folded),
            entities,
        }
    }

    fn matched(table: &Table, raw: &str) -> Vec<String> {
        let query = normalize(raw).unwrap();
        match_table(&table.entities, &table.names, &table.trigrams, &query, 0.3)
            .unwrap()
            .into_iter()
            .map(|c| c.entity.name().to_string())
            .collect()
    }

    #[test]
    fn test_cali_matches_cali_and_calima_only() {
        let t = table(&["Cali", "Calima", "Popayán"]);
        assert_eq!(matched(&t, "cali"), vec!["Cali", "Calima"]);
    }

    #[test]
    fn test_substring_alone_is_enough() {
        // "rta" shares one trigram with "cartago" and is not a lexeme
        let t = table(&["Cartago", "Pasto"]);
        let query = normalize("rta").unwrap();
        let out = match_table(&t.entities, &t.names, &t.trigrams, &query, 0.3).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].substring);
        assert!(!out[0].full_text);
        assert!(out[0].similarity <= 0.3);
    }

    #[test]
    fn test_full_text_ignores_word_order() {
        let t = table(&["San Antonio de Prado", "Santa Elena"]);
        let query = normalize("prado antonio").unwrap();
        let out = match_table(&t.entities, &t.names, &t.trigrams, &query, 0.3).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].full_text);
        assert!(out[0].rank > 0.0);
        assert!(!out[0].substring);
    }

    #[test]
    fn test_trigram_catches_misspelling() {
        let t = table(&["Medellín", "Envigado"]);
        let query = normalize("medelin").unwrap();
        let out = match_table(&t.entities, &t.names, &t.trigrams, &query, 0.3).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].similarity > 0.3);
        assert_eq!(out[0].entity.name(), "Medellín");
    }

    #[test]
    fn test_accents_do_not_matter() {
        let t = table(&["Popayán", "Quibdó"]);
        assert_eq!(matched(&t, "popayan"), vec!["Popayán"]);
        assert_eq!(matched(&t, "QUIBDO"), vec!["Quibdó"]);
    }

    #[test]
    fn test_unrelated_query_matches_nothing() {
        let t = table(&["Cali", "Calima", "Popayán"]);
        assert!(matched(&t, "zzzz").is_empty());
    }
}
