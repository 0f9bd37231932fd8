//! SQLite row types and the mapping to/from `alif_core::domain` types.
use std::collections::HashMap;

use alif_core::domain::{
    AcquisitionFields, Box3, Comprehension, CreditType, FsrsPhase, GrammarExposure,
    GrammarFeature, KnowledgeState, Lemma, LongTermCard, MemoryState, Mode, ReviewGrade,
    ReviewLog, Root, Sentence, Token, VariantStat,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, FromRow)]
pub struct LemmaRow {
    pub id: i64,
    pub surface: String,
    pub gloss: String,
    pub part_of_speech: String,
    pub frequency_rank: i64,
    pub root_id: Option<i64>,
    pub canonical_id: Option<i64>,
    pub thematic_tag: Option<String>,
    pub is_function_word: i64,
}

impl From<LemmaRow> for Lemma {
    fn from(row: LemmaRow) -> Self {
        Lemma {
            id: row.id,
            surface: row.surface,
            gloss: row.gloss,
            part_of_speech: row.part_of_speech,
            frequency_rank: row.frequency_rank as u32,
            root_id: row.root_id,
            canonical_id: row.canonical_id,
            thematic_tag: row.thematic_tag,
            is_function_word: row.is_function_word != 0,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RootRow {
    pub id: i64,
    pub skeleton: String,
}

impl From<RootRow> for Root {
    fn from(row: RootRow) -> Self {
        Root { id: row.id, skeleton: row.skeleton }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GrammarFeatureRow {
    pub id: i64,
    pub name: String,
}

impl From<GrammarFeatureRow> for GrammarFeature {
    fn from(row: GrammarFeatureRow) -> Self {
        GrammarFeature { id: row.id, name: row.name }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GrammarExposureRow {
    pub feature_id: i64,
    pub times_seen: i64,
    pub times_correct: i64,
    pub comfort: f64,
    pub last_seen_at: Option<i64>,
}

impl From<GrammarExposureRow> for GrammarExposure {
    fn from(row: GrammarExposureRow) -> Self {
        GrammarExposure {
            feature_id: row.feature_id,
            times_seen: row.times_seen as u32,
            times_correct: row.times_correct as u32,
            comfort: row.comfort,
            last_seen_at: row.last_seen_at.and_then(millis_to_datetime),
        }
    }
}

pub fn grammar_exposure_to_row(exposure: &GrammarExposure) -> GrammarExposureRow {
    GrammarExposureRow {
        feature_id: exposure.feature_id,
        times_seen: exposure.times_seen as i64,
        times_correct: exposure.times_correct as i64,
        comfort: exposure.comfort,
        last_seen_at: exposure.last_seen_at.map(|t| t.timestamp_millis()),
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MemoryStateRow {
    pub lemma_id: i64,
    pub knowledge_state: String,
    pub times_seen: i64,
    pub times_correct: i64,
    pub source: String,
    pub variant_stats: String,
    pub entered_acquiring_at: Option<i64>,
    pub graduated_at: Option<i64>,
    pub leech_suspended_at: Option<i64>,
    pub leech_count: i64,
    pub box_num: Option<i64>,
    pub next_due_at: Option<i64>,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub due_at: Option<i64>,
    pub last_reviewed_at: Option<i64>,
    pub fsrs_phase: Option<String>,
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

fn knowledge_state_from_str(s: &str) -> Result<KnowledgeState> {
    match s {
        "encountered" => Ok(KnowledgeState::Encountered),
        "acquiring" => Ok(KnowledgeState::Acquiring),
        "learning" => Ok(KnowledgeState::Learning),
        "known" => Ok(KnowledgeState::Known),
        "lapsed" => Ok(KnowledgeState::Lapsed),
        "suspended" => Ok(KnowledgeState::Suspended),
        other => Err(StorageError::Other(format!("unknown knowledge_state: {other}"))),
    }
}

fn knowledge_state_to_str(state: KnowledgeState) -> &'static str {
    match state {
        KnowledgeState::Encountered => "encountered",
        KnowledgeState::Acquiring => "acquiring",
        KnowledgeState::Learning => "learning",
        KnowledgeState::Known => "known",
        KnowledgeState::Lapsed => "lapsed",
        KnowledgeState::Suspended => "suspended",
    }
}

fn fsrs_phase_from_str(s: &str) -> Result<FsrsPhase> {
    match s {
        "learning" => Ok(FsrsPhase::Learning),
        "review" => Ok(FsrsPhase::Review),
        "relearning" => Ok(FsrsPhase::Relearning),
        other => Err(StorageError::Other(format!("unknown fsrs_phase: {other}"))),
    }
}

fn fsrs_phase_to_str(phase: FsrsPhase) -> &'static str {
    match phase {
        FsrsPhase::Learning => "learning",
        FsrsPhase::Review => "review",
        FsrsPhase::Relearning => "relearning",
    }
}

impl MemoryStateRow {
    pub fn into_domain(self) -> Result<MemoryState> {
        let variant_stats: HashMap<i64, VariantStat> = serde_json::from_str(&self.variant_stats)
            .map_err(|e| StorageError::Other(format!("corrupt variant_stats json: {e}")))?;

        let acquisition = match (self.box_num, self.next_due_at, self.entered_acquiring_at) {
            (Some(box_num), Some(next_due_at), Some(entered)) => Some(AcquisitionFields {
                box_num: Box3::new(box_num as u8),
                next_due_at: millis_to_datetime(next_due_at).unwrap_or_else(Utc::now),
                entered_acquiring_at: millis_to_datetime(entered).unwrap_or_else(Utc::now),
            }),
            _ => None,
        };

        let card = match (self.stability, self.difficulty, self.due_at, self.last_reviewed_at, &self.fsrs_phase) {
            (Some(stability), Some(difficulty), Some(due_at), Some(last_reviewed_at), Some(phase)) => Some(LongTermCard {
                stability,
                difficulty,
                due_at: millis_to_datetime(due_at).unwrap_or_else(Utc::now),
                last_reviewed_at: millis_to_datetime(last_reviewed_at).unwrap_or_else(Utc::now),
                fsrs_phase: fsrs_phase_from_str(phase)?,
            }),
            _ => None,
        };

        Ok(MemoryState {
            lemma_id: self.lemma_id,
            knowledge_state: knowledge_state_from_str(&self.knowledge_state)?,
            times_seen: self.times_seen as u32,
            times_correct: self.times_correct as u32,
            source: self.source,
            variant_stats,
            entered_acquiring_at: self.entered_acquiring_at.and_then(millis_to_datetime),
            graduated_at: self.graduated_at.and_then(millis_to_datetime),
            leech_suspended_at: self.leech_suspended_at.and_then(millis_to_datetime),
            leech_count: self.leech_count as u32,
            acquisition,
            card,
        })
    }
}

pub struct MemoryStateColumns {
    pub knowledge_state: String,
    pub variant_stats: String,
    pub entered_acquiring_at: Option<i64>,
    pub graduated_at: Option<i64>,
    pub leech_suspended_at: Option<i64>,
    pub box_num: Option<i64>,
    pub next_due_at: Option<i64>,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub due_at: Option<i64>,
    pub last_reviewed_at: Option<i64>,
    pub fsrs_phase: Option<String>,
}

pub fn memory_state_to_columns(state: &MemoryState) -> Result<MemoryStateColumns> {
    let variant_stats = serde_json::to_string(&state.variant_stats)
        .map_err(|e| StorageError::Other(format!("failed to serialize variant_stats: {e}")))?;
    Ok(MemoryStateColumns {
        knowledge_state: knowledge_state_to_str(state.knowledge_state).to_string(),
        variant_stats,
        entered_acquiring_at: state.entered_acquiring_at.map(|t| t.timestamp_millis()),
        graduated_at: state.graduated_at.map(|t| t.timestamp_millis()),
        leech_suspended_at: state.leech_suspended_at.map(|t| t.timestamp_millis()),
        box_num: state.acquisition.map(|a| a.box_num.value() as i64),
        next_due_at: state.acquisition.map(|a| a.next_due_at.timestamp_millis()),
        stability: state.card.map(|c| c.stability),
        difficulty: state.card.map(|c| c.difficulty),
        due_at: state.card.map(|c| c.due_at.timestamp_millis()),
        last_reviewed_at: state.card.map(|c| c.last_reviewed_at.timestamp_millis()),
        fsrs_phase: state.card.map(|c| fsrs_phase_to_str(c.fsrs_phase).to_string()),
    })
}

#[derive(Debug, Clone, FromRow)]
pub struct SentenceRow {
    pub id: i64,
    pub arabic: String,
    pub translation: String,
    pub transliteration: Option<String>,
    pub target_lemma_id: Option<i64>,
    pub times_shown: i64,
    pub last_shown_at: Option<i64>,
    pub is_active: i64,
    pub max_word_count: i64,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub sentence_id: i64,
    pub position: i64,
    pub surface: String,
    pub lemma_id: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ComprehensionRow {
    pub sentence_id: i64,
    pub mode: String,
    pub last_comprehension: String,
}

pub fn mode_to_str(mode: Mode) -> &'static str {
    match mode {
        Mode::Reading => "reading",
        Mode::Listening => "listening",
    }
}

pub fn mode_from_str(s: &str) -> Result<Mode> {
    match s {
        "reading" => Ok(Mode::Reading),
        "listening" => Ok(Mode::Listening),
        other => Err(StorageError::Other(format!("unknown mode: {other}"))),
    }
}

pub fn comprehension_to_str(value: Comprehension) -> &'static str {
    match value {
        Comprehension::Understood => "understood",
        Comprehension::Partial => "partial",
        Comprehension::GrammarConfused => "grammar_confused",
        Comprehension::NoIdea => "no_idea",
    }
}

pub fn comprehension_from_str(s: &str) -> Result<Comprehension> {
    match s {
        "understood" => Ok(Comprehension::Understood),
        "partial" => Ok(Comprehension::Partial),
        "grammar_confused" => Ok(Comprehension::GrammarConfused),
        "no_idea" => Ok(Comprehension::NoIdea),
        other => Err(StorageError::Other(format!("unknown comprehension signal: {other}"))),
    }
}

pub fn assemble_sentence(
    row: SentenceRow,
    tokens: Vec<TokenRow>,
    grammar_features: Vec<i64>,
    comprehension: Vec<ComprehensionRow>,
) -> Result<Sentence> {
    let mut ordered_tokens = tokens;
    ordered_tokens.sort_by_key(|t| t.position);

    let mut last_comprehension = HashMap::new();
    for row in comprehension {
        last_comprehension.insert(mode_from_str(&row.mode)?, comprehension_from_str(&row.last_comprehension)?);
    }

    Ok(Sentence {
        id: row.id,
        arabic: row.arabic,
        translation: row.translation,
        transliteration: row.transliteration,
        tokens: ordered_tokens
            .into_iter()
            .map(|t| Token { surface: t.surface, lemma_id: t.lemma_id })
            .collect(),
        target_lemma_id: row.target_lemma_id,
        times_shown: row.times_shown as u32,
        last_shown_at: row.last_shown_at.and_then(millis_to_datetime),
        last_comprehension,
        is_active: row.is_active != 0,
        max_word_count: row.max_word_count as u32,
        audio_url: row.audio_url,
        grammar_features,
    })
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewLogRow {
    pub id: i64,
    pub client_review_id: String,
    pub lemma_id: i64,
    pub rating: i64,
    pub sentence_id: i64,
    pub session_id: i64,
    pub timestamp: i64,
    pub response_ms: i64,
    pub credit_type: String,
    pub pre_review_snapshot: String,
}

fn rating_from_i64(value: i64) -> Result<ReviewGrade> {
    match value {
        1 => Ok(ReviewGrade::Again),
        2 => Ok(ReviewGrade::Hard),
        3 => Ok(ReviewGrade::Good),
        4 => Ok(ReviewGrade::Easy),
        other => Err(StorageError::Other(format!("rating out of range: {other}"))),
    }
}

fn credit_type_from_str(s: &str) -> Result<CreditType> {
    match s {
        "primary" => Ok(CreditType::Primary),
        "collateral" => Ok(CreditType::Collateral),
        other => Err(StorageError::Other(format!("unknown credit_type: {other}"))),
    }
}

pub fn credit_type_to_str(value: CreditType) -> &'static str {
    match value {
        CreditType::Primary => "primary",
        CreditType::Collateral => "collateral",
    }
}

impl ReviewLogRow {
    pub fn into_domain(self) -> Result<ReviewLog> {
        let pre_review_snapshot: MemoryStateJson = serde_json::from_str(&self.pre_review_snapshot)
            .map_err(|e| StorageError::Other(format!("corrupt pre_review_snapshot: {e}")))?;
        Ok(ReviewLog {
            id: self.id,
            client_review_id: self.client_review_id,
            lemma_id: self.lemma_id,
            rating: rating_from_i64(self.rating)?,
            sentence_id: self.sentence_id,
            session_id: self.session_id,
            timestamp: millis_to_datetime(self.timestamp).unwrap_or_else(Utc::now),
            response_ms: self.response_ms as u32,
            credit_type: credit_type_from_str(&self.credit_type)?,
            pre_review_snapshot: pre_review_snapshot.0,
        })
    }
}

/// `MemoryState` round-trips through `serde_json` directly; this wrapper
/// only exists so the blob has a named type at the call site.
struct MemoryStateJson(MemoryState);

impl<'de> serde::Deserialize<'de> for MemoryStateJson {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <MemoryState as serde::Deserialize>::deserialize(deserializer).map(MemoryStateJson)
    }
}

pub fn rating_to_i64(rating: ReviewGrade) -> i64 {
    match rating {
        ReviewGrade::Again => 1,
        ReviewGrade::Hard => 2,
        ReviewGrade::Good => 3,
        ReviewGrade::Easy => 4,
    }
}
