//! Indexes over the folded names of one subdivision table.
//!
//! Two structures back the candidate matcher:
//! - [`NameIndex`], an in-memory Tantivy index with a Spanish analyzer
//!   (lower-casing, Spanish stop words, Snowball stemming) answering
//!   "contains all query lexemes" and providing a cover-density rank;
//! - [`TrigramIndex`], an inverted trigram index for similarity lookups.

pub use error::IndexError;
use error::Result;
use tantivy::{
    Index, IndexReader, IndexWriter, TantivyDocument, Term,
    collector::DocSetCollector,
    query::{BooleanQuery, Occur, Query, TermQuery},
    schema::{
        FAST, Field, INDEXED, IndexRecordOption, STORED, Schema, SchemaBuilder, TextFieldIndexing,
        TextOptions, Value,
    },
    tokenizer::{
        Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
        TextAnalyzer, TokenStream,
    },
};
use tracing::{debug, instrument, trace};

pub mod trigram;

pub use trigram::TrigramIndex;

/// Name under which the Spanish analyzer is registered on every index.
pub const SPANISH_ANALYZER: &str = "es_stem";

/// Weight of a single cover, as for unlabeled lexemes in `ts_rank_cd`.
const COVER_WEIGHT: f64 = 0.1;

/// One analyzed token: the lexeme and its word position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub term: String,
    pub position: usize,
}

/// Build the Spanish text analyzer used for both names and queries.
pub fn spanish_analyzer() -> Result<TextAnalyzer> {
    let stop_words = StopWordFilter::new(Language::Spanish)
        .ok_or_else(|| anyhow::anyhow!("Spanish stop word list is not available"))?;
    Ok(TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(stop_words)
        .filter(Stemmer::new(Language::Spanish))
        .build())
}

/// Run `analyzer` over `text`, keeping positions (stop words leave gaps).
pub fn analyze(analyzer: &TextAnalyzer, text: &str) -> Vec<Lexeme> {
    let mut analyzer = analyzer.clone();
    let mut stream = analyzer.token_stream(text);
    let mut lexemes = Vec::new();
    while let Some(token) = stream.next() {
        lexemes.push(Lexeme {
            term: token.text.clone(),
            position: token.position,
        });
    }
    lexemes
}

/// Distinct query terms, in first-seen order.
pub fn query_terms(lexemes: &[Lexeme]) -> Vec<String> {
    let mut terms: Vec<String> = Vec::with_capacity(lexemes.len());
    for lexeme in lexemes {
        if !terms.contains(&lexeme.term) {
            terms.push(lexeme.term.clone());
        }
    }
    terms
}

/// Cover-density rank of `terms` over a document's lexemes.
///
/// A cover is a minimal run of document positions that contains every query
/// term. Each cover contributes `0.1 / (1 + noise)`, where `noise` is the
/// number of non-query words inside it. Returns 0 when some term is absent.
pub fn cover_density_rank(doc: &[Lexeme], terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }

    // (position, term slot) for every document lexeme that is a query term
    let mut hits: Vec<(usize, usize)> = doc
        .iter()
        .filter_map(|lexeme| {
            terms
                .iter()
                .position(|t| *t == lexeme.term)
                .map(|slot| (lexeme.position, slot))
        })
        .collect();
    hits.sort_unstable();

    let mut rank = 0.0;
    let mut start = 0;
    while start < hits.len() {
        let Some(end) = cover_end(&hits[start..], terms.len()).map(|e| start + e) else {
            break;
        };
        let begin = start + cover_begin(&hits[start..=end], terms.len());

        let positions = hits[end].0 - hits[begin].0;
        let entries = end - begin;
        let noise = positions.saturating_sub(entries);
        rank += COVER_WEIGHT / (1 + noise) as f64;

        start = begin + 1;
    }
    rank
}

/// Index of the first hit at which every term has been seen.
fn cover_end(hits: &[(usize, usize)], n_terms: usize) -> Option<usize> {
    let mut seen = vec![false; n_terms];
    let mut count = 0;
    for (i, (_, slot)) in hits.iter().enumerate() {
        if !seen[*slot] {
            seen[*slot] = true;
            count += 1;
            if count == n_terms {
                return Some(i);
            }
        }
    }
    None
}

/// Walking back from the last hit, index where every term has been seen.
fn cover_begin(hits: &[(usize, usize)], n_terms: usize) -> usize {
    let mut seen = vec![false; n_terms];
    let mut count = 0;
    for (i, (_, slot)) in hits.iter().enumerate().rev() {
        if !seen[*slot] {
            seen[*slot] = true;
            count += 1;
            if count == n_terms {
                return i;
            }
        }
    }
    0
}

/// In-memory full-text index over the folded names of one table.
///
/// Documents are keyed by their row in the owning table. The analyzed form
/// of every name is kept next to the index so ranking never has to go back
/// to Tantivy's stored fields.
#[derive(Clone)]
pub struct NameIndex {
    index: Index,
    reader: IndexReader,
    analyzer: TextAnalyzer,
    row_field: Field,
    name_field: Field,
    row_lexemes: Vec<Vec<Lexeme>>,
}

impl std::fmt::Debug for NameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameIndex")
            .field("docs", &self.row_lexemes.len())
            .finish_non_exhaustive()
    }
}

impl NameIndex {
    fn schema() -> Schema {
        let mut schema_builder = SchemaBuilder::new();
        let text_indexing = TextFieldIndexing::default()
            .set_tokenizer(SPANISH_ANALYZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let text_options = TextOptions::default().set_indexing_options(text_indexing);

        schema_builder.add_u64_field("row", STORED | INDEXED | FAST);
        schema_builder.add_text_field("name", text_options);
        schema_builder.build()
    }

    /// Index `names`; document `i` is row `i`.
    #[instrument(name = "Build Name Index", skip_all, fields(rows = names.len()), level = "debug")]
    pub fn build<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let schema = Self::schema();
        let row_field = schema.get_field("row")?;
        let name_field = schema.get_field("name")?;

        let index = Index::create_in_ram(schema);
        let analyzer = spanish_analyzer()?;
        index
            .tokenizers()
            .register(SPANISH_ANALYZER, analyzer.clone());

        let t_index = std::time::Instant::now();
        let mut writer: IndexWriter = index.writer_with_num_threads(1, 50_000_000)?;
        let mut row_lexemes = Vec::with_capacity(names.len());
        for (row, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let mut doc = TantivyDocument::default();
            doc.add_u64(row_field, row as u64);
            doc.add_text(name_field, name);
            writer.add_document(doc)?;
            row_lexemes.push(analyze(&analyzer, name));
        }
        writer.commit()?;
        let reader = index.reader()?;
        debug!(
            docs = row_lexemes.len(),
            elapsed = ?t_index.elapsed(),
            "Name index committed"
        );

        Ok(Self {
            index,
            reader,
            analyzer,
            row_field,
            name_field,
            row_lexemes,
        })
    }

    pub fn len(&self) -> usize {
        self.row_lexemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_lexemes.is_empty()
    }

    /// Analyze `text` with this index's analyzer.
    pub fn analyze(&self, text: &str) -> Vec<Lexeme> {
        analyze(&self.analyzer, text)
    }

    /// Lexemes stored for `row`.
    pub fn lexemes(&self, row: usize) -> &[Lexeme] {
        self.row_lexemes.get(row).map(Vec::as_slice).unwrap_or_default()
    }

    /// Cover-density rank of `terms` against the name at `row`.
    pub fn rank(&self, row: usize, terms: &[String]) -> f64 {
        cover_density_rank(self.lexemes(row), terms)
    }

    fn build_query(&self, terms: &[String]) -> Box<dyn Query> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|term| {
                let term = Term::from_field_text(self.name_field, term);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                (Occur::Must, query)
            })
            .collect();
        Box::new(BooleanQuery::new(clauses))
    }

    /// Rows whose name contains every term, in ascending row order.
    ///
    /// `terms` are already analyzed lexemes; an empty slice matches nothing.
    #[instrument(name = "Search Name Index", skip_all, fields(terms = ?terms), level = "debug")]
    pub fn rows_matching(&self, terms: &[String]) -> Result<Vec<usize>> {
        if terms.is_empty() || self.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.build_query(terms);
        trace!(?query, "Name query constructed");

        let searcher = self.reader.searcher();
        let doc_addresses = searcher.search(&*query, &DocSetCollector)?;

        let mut rows = doc_addresses
            .into_iter()
            .map(|doc_address| {
                let doc = searcher.doc::<TantivyDocument>(doc_address)?;
                let row = doc
                    .get_first(self.row_field)
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| anyhow::anyhow!("Failed to get row from document: {doc:?}"))?;
                Ok(row as usize)
            })
            .collect::<Result<Vec<_>>>()?;
        rows.sort_unstable();
        debug!(num_results = rows.len(), "Name index search complete");
        Ok(rows)
    }

    /// Number of documents Tantivy reports, for consistency checks.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum IndexError {
        #[error("Tantivy error: {0}")]
        Tantivy(#[from] tantivy::TantivyError),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
    pub type Result<T> = std::result::Result<T, IndexError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(pairs: &[(&str, usize)]) -> Vec<Lexeme> {
        pairs
            .iter()
            .map(|(term, position)| Lexeme {
                term: (*term).to_string(),
                position: *position,
            })
            .collect()
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_analyzer_drops_spanish_stop_words() {
        let analyzer = spanish_analyzer().unwrap();
        let out = analyze(&analyzer, "san antonio de prado");
        let words: Vec<&str> = out.iter().map(|l| l.term.as_str()).collect();
        assert!(!words.contains(&"de"), "'de' is a Spanish stop word: {words:?}");
        assert_eq!(out.len(), 3);
        // positions keep the gap left by the stop word
        assert_eq!(out[2].position, 3);
    }

    #[test]
    fn test_analyzer_stems_plural_forms() {
        let analyzer = spanish_analyzer().unwrap();
        let singular = analyze(&analyzer, "pueblo");
        let plural = analyze(&analyzer, "pueblos");
        assert_eq!(singular[0].term, plural[0].term);
    }

    #[test]
    fn test_query_terms_are_deduplicated() {
        let out = query_terms(&lexemes(&[("cali", 0), ("vall", 1), ("cali", 2)]));
        assert_eq!(out, terms(&["cali", "vall"]));
    }

    #[test]
    fn test_rank_single_term_single_cover() {
        let doc = lexemes(&[("cali", 0)]);
        assert!((cover_density_rank(&doc, &terms(&["cali"])) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_rank_counts_every_cover() {
        let doc = lexemes(&[("cali", 0), ("cali", 1)]);
        assert!((cover_density_rank(&doc, &terms(&["cali"])) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_rank_penalizes_noise_inside_cover() {
        let tight = lexemes(&[("san", 0), ("anton", 1)]);
        let loose = lexemes(&[("san", 0), ("pedr", 1), ("anton", 2)]);
        let q = terms(&["san", "anton"]);
        let tight_rank = cover_density_rank(&tight, &q);
        let loose_rank = cover_density_rank(&loose, &q);
        assert!((tight_rank - 0.1).abs() < 1e-9);
        assert!((loose_rank - 0.05).abs() < 1e-9);
        assert!(tight_rank > loose_rank);
    }

    #[test]
    fn test_rank_zero_when_term_missing() {
        let doc = lexemes(&[("san", 0), ("pedr", 1)]);
        assert_eq!(cover_density_rank(&doc, &terms(&["san", "anton"])), 0.0);
        assert_eq!(cover_density_rank(&doc, &[]), 0.0);
    }

    #[test]
    fn test_name_index_requires_all_terms() {
        let index =
            NameIndex::build(&["san antonio", "san antonio de prado", "santa elena"]).unwrap();
        assert_eq!(index.num_docs(), 3);

        let q = query_terms(&index.analyze("antonio san"));
        assert_eq!(index.rows_matching(&q).unwrap(), vec![0, 1]);

        let q = query_terms(&index.analyze("prado"));
        assert_eq!(index.rows_matching(&q).unwrap(), vec![1]);
    }

    #[test]
    fn test_name_index_stop_word_only_query_matches_nothing() {
        let index = NameIndex::build(&["la estrella", "el poblado"]).unwrap();
        let q = query_terms(&index.analyze("la"));
        assert!(q.is_empty());
        assert!(index.rows_matching(&q).unwrap().is_empty());
    }

    #[test]
    fn test_name_index_rank_uses_stored_lexemes() {
        let index = NameIndex::build(&["cali", "calima"]).unwrap();
        let q = query_terms(&index.analyze("cali"));
        assert!(index.rank(0, &q) > 0.0);
        assert_eq!(index.rank(7, &q), 0.0, "Unknown rows rank zero");
    }

    #[test]
    fn test_empty_name_index() {
        let names: [&str; 0] = [];
        let index = NameIndex::build(&names).unwrap();
        assert!(index.is_empty());
        assert!(index.rows_matching(&terms(&["cali"])).unwrap().is_empty());
    }
}
