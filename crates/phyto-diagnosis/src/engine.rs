//! The tiered diagnosis state machine.
//!
//! ```text
//! Init ─► TryKnowledgeBase ─► TryCache ─► TryAi ─► Resolved(ai)
//!               │                 │          └───► Failed
//!               ▼                 ▼
//!      Resolved(knowledge_base) Resolved(cache)
//! ```
//!
//! Each request walks the states once, without retries. A tier that finds
//! nothing confident hands over to the next; only the AI tier or a failing
//! store can end in `Failed`. Every resolved [`Diagnosis`] carries the tier
//! that produced it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use phyto_config::{DiagnosisConfig, PhytoConfig};
use phyto_core::entities::PlantType;
use phyto_core::enums::DiagnosisSource;
use phyto_core::matches::DiseaseWithMatchInfo;
use phyto_db::helpers::latest_storable_datetime;
use phyto_db::repos::NewCacheEntry;
use phyto_db::service::PhytoService;
use phyto_vision::{ErrorSource, VisionDebugInfo, VisionGateway, VisionRequest};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::answer;
use crate::cache_match::{self, CacheMatcher};
use crate::dictionary::{DictionaryHandle, SymptomExtractor};
use crate::error::DiagnosisError;
use crate::knowledge::{self, KnowledgeBaseMatcher};
use crate::lifecycle::CacheLifecycle;
use crate::normalize::normalize;
use crate::similarity::{Similarity, TrigramSimilarity};

/// One diagnosis request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    /// Free-text symptom description. May be empty when an image is given.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Plant type ID or (fuzzy) name.
    #[serde(default)]
    pub plant_type: Option<String>,
    /// AI answer language; the configured default when unset.
    #[serde(default)]
    pub language: Option<String>,
}

/// States of the per-request machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "source", rename_all = "snake_case")]
pub enum DiagnosisState {
    Init,
    TryKnowledgeBase,
    TryCache,
    TryAi,
    Resolved(DiagnosisSource),
    Failed,
}

/// A resolved diagnosis with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub source: DiagnosisSource,
    pub disease_name: String,
    /// Knowledge-base overlap or cache final score that accepted the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub normalized_description: String,
    pub symptom_ids: BTreeSet<String>,
    /// Resolved plant type name, or the hint as given when unresolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_count: Option<i64>,
    /// Verbatim AI answer (cache and AI tiers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// States visited, ending in `Resolved(source)`.
    pub states: Vec<DiagnosisState>,
}

/// Engine tuning, usually taken from [`PhytoConfig`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub diagnosis: DiagnosisConfig,
    /// Upper bound on the AI call.
    pub ai_timeout: Duration,
    /// Default AI answer language.
    pub language: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&PhytoConfig::default())
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_config(config: &PhytoConfig) -> Self {
        Self {
            diagnosis: config.diagnosis.clone(),
            ai_timeout: config.vision.timeout(),
            language: config.vision.language.clone(),
        }
    }
}

struct PreparedQuery {
    normalized: String,
    symptom_ids: BTreeSet<String>,
    plant_type: Option<PlantType>,
    plant_label: Option<String>,
}

impl PreparedQuery {
    fn diagnosis(&self, source: DiagnosisSource, disease_name: String) -> Diagnosis {
        Diagnosis {
            source,
            disease_name,
            score: None,
            normalized_description: self.normalized.clone(),
            symptom_ids: self.symptom_ids.clone(),
            plant_type: self.plant_label.clone(),
            disease_id: None,
            description: None,
            treatment: None,
            cache_id: None,
            hit_count: None,
            ai_response: None,
            model: None,
            provider: None,
            states: Vec::new(),
        }
    }
}

/// Knowledge base, then cache, then AI.
///
/// Built from explicitly passed collaborators; holds no global state. Safe
/// to share behind an `Arc` across concurrent requests.
pub struct DiagnosisEngine<G, S = TrigramSimilarity> {
    store: Arc<PhytoService>,
    dictionary: Arc<DictionaryHandle>,
    extractor: SymptomExtractor,
    knowledge: KnowledgeBaseMatcher,
    cache: CacheMatcher<S>,
    lifecycle: CacheLifecycle,
    gateway: G,
    settings: EngineSettings,
}

impl<G: VisionGateway> DiagnosisEngine<G> {
    pub fn new(
        store: Arc<PhytoService>,
        dictionary: Arc<DictionaryHandle>,
        gateway: G,
        settings: EngineSettings,
    ) -> Self {
        Self::with_similarity(store, dictionary, gateway, settings, TrigramSimilarity)
    }
}

impl<G: VisionGateway, S: Similarity> DiagnosisEngine<G, S> {
    /// Like [`DiagnosisEngine::new`] with a custom cache similarity.
    pub fn with_similarity(
        store: Arc<PhytoService>,
        dictionary: Arc<DictionaryHandle>,
        gateway: G,
        settings: EngineSettings,
        similarity: S,
    ) -> Self {
        Self {
            extractor: SymptomExtractor {
                max_distance: settings.diagnosis.fuzzy_max_distance,
                min_term_len: settings.diagnosis.fuzzy_min_term_len,
            },
            knowledge: KnowledgeBaseMatcher::new(Arc::clone(&store)),
            cache: CacheMatcher::new(
                Arc::clone(&store),
                similarity,
                settings.diagnosis.cache_text_weight,
            ),
            lifecycle: CacheLifecycle::new(Arc::clone(&store)),
            store,
            dictionary,
            gateway,
            settings,
        }
    }

    pub fn dictionary(&self) -> &DictionaryHandle {
        &self.dictionary
    }

    pub const fn lifecycle(&self) -> &CacheLifecycle {
        &self.lifecycle
    }

    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Diagnose one request.
    ///
    /// `cancel` aborts a pending AI call; the knowledge-base and cache tiers
    /// are never interrupted.
    ///
    /// # Errors
    ///
    /// - [`DiagnosisError::GatewayUnavailable`] when the AI tier is needed
    ///   but not configured. Nothing is written.
    /// - [`DiagnosisError::GatewayCallFailed`] when the AI call fails or
    ///   times out.
    /// - [`DiagnosisError::Cancelled`] when `cancel` fires during the AI call.
    /// - [`DiagnosisError::Persistence`] when the store fails, including
    ///   when an AI answer cannot be cached.
    pub async fn diagnose(
        &self,
        request: &DiagnosisRequest,
        cancel: &CancellationToken,
    ) -> Result<Diagnosis, DiagnosisError> {
        let mut states = Vec::with_capacity(5);
        match self.run(request, cancel, &mut states).await {
            Ok(mut diagnosis) => {
                states.push(DiagnosisState::Resolved(diagnosis.source));
                diagnosis.states = states;
                tracing::info!(
                    source = %diagnosis.source,
                    disease = %diagnosis.disease_name,
                    score = diagnosis.score,
                    "diagnosis resolved"
                );
                Ok(diagnosis)
            }
            Err(e) => {
                states.push(DiagnosisState::Failed);
                tracing::warn!(
                    states = ?states,
                    error_source = %e.error_source(),
                    %e,
                    "diagnosis failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &DiagnosisRequest,
        cancel: &CancellationToken,
        states: &mut Vec<DiagnosisState>,
    ) -> Result<Diagnosis, DiagnosisError> {
        enter(states, DiagnosisState::Init);
        let query = self.prepare(request).await?;

        enter(states, DiagnosisState::TryKnowledgeBase);
        if let Some(diagnosis) = self.try_knowledge_base(&query).await? {
            return Ok(diagnosis);
        }

        enter(states, DiagnosisState::TryCache);
        if let Some(diagnosis) = self.try_cache(&query).await? {
            return Ok(diagnosis);
        }

        enter(states, DiagnosisState::TryAi);
        self.try_ai(request, &query, cancel).await
    }

    async fn prepare(&self, request: &DiagnosisRequest) -> Result<PreparedQuery, DiagnosisError> {
        let normalized = normalize(&request.description);
        let dictionary = self.dictionary.snapshot();
        let symptom_ids = self.extractor.extract(&dictionary, &normalized);

        let plant_type = self
            .knowledge
            .resolve_plant_type(request.plant_type.as_deref())
            .await?;
        let plant_label = plant_type.as_ref().map(|p| p.name.clone()).or_else(|| {
            request
                .plant_type
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(ToString::to_string)
        });

        tracing::debug!(
            normalized = %normalized,
            symptoms = symptom_ids.len(),
            plant_type = plant_label.as_deref(),
            "request prepared"
        );
        Ok(PreparedQuery {
            normalized,
            symptom_ids,
            plant_type,
            plant_label,
        })
    }

    async fn try_knowledge_base(
        &self,
        query: &PreparedQuery,
    ) -> Result<Option<Diagnosis>, DiagnosisError> {
        let matches = self
            .knowledge
            .match_for_plant_type(&query.symptom_ids, query.plant_type.as_ref())
            .await?;
        let threshold = self.settings.diagnosis.kb_acceptance_threshold;

        let Some(top) = knowledge::confident(&matches, threshold) else {
            tracing::debug!(
                candidates = matches.len(),
                top = matches.first().map(DiseaseWithMatchInfo::score),
                threshold,
                "no confident knowledge-base match"
            );
            return Ok(None);
        };

        let disease = &top.disease;
        let mut diagnosis = query.diagnosis(DiagnosisSource::KnowledgeBase, disease.name.clone());
        diagnosis.score = Some(top.score());
        diagnosis.disease_id = Some(disease.id.clone());
        diagnosis.description.clone_from(&disease.description);
        diagnosis.treatment.clone_from(&disease.treatment);
        if diagnosis.plant_type.is_none() {
            diagnosis.plant_type.clone_from(&disease.plant_type_name);
        }
        Ok(Some(diagnosis))
    }

    async fn try_cache(&self, query: &PreparedQuery) -> Result<Option<Diagnosis>, DiagnosisError> {
        let config = &self.settings.diagnosis;
        let candidates = self
            .cache
            .search_candidates(
                &query.normalized,
                &query.symptom_ids,
                query.plant_label.as_deref(),
                config.trigram_threshold,
                usize::try_from(config.candidate_limit).unwrap_or(usize::MAX),
            )
            .await?;

        let Some(top) = cache_match::confident(&candidates, config.cache_acceptance_threshold)
        else {
            tracing::debug!(
                candidates = candidates.len(),
                top = candidates.first().map(|c| c.final_score),
                threshold = config.cache_acceptance_threshold,
                "no confident cache match"
            );
            return Ok(None);
        };

        let entry = &top.entry;
        let counted = match self.lifecycle.increment_hit_count(&entry.id).await {
            Ok(counted) => counted,
            Err(e) => {
                tracing::warn!(cache_id = %entry.id, %e, "failed to count cache hit");
                false
            }
        };

        let mut diagnosis = query.diagnosis(DiagnosisSource::Cache, entry.disease_name.clone());
        diagnosis.score = Some(top.final_score);
        diagnosis.cache_id = Some(entry.id.clone());
        diagnosis.hit_count = Some(entry.hit_count + i64::from(counted));
        diagnosis.ai_response = Some(entry.ai_response.clone());
        if diagnosis.plant_type.is_none() {
            diagnosis.plant_type.clone_from(&entry.plant_type);
        }
        Ok(Some(diagnosis))
    }

    async fn try_ai(
        &self,
        request: &DiagnosisRequest,
        query: &PreparedQuery,
        cancel: &CancellationToken,
    ) -> Result<Diagnosis, DiagnosisError> {
        let vision_request = VisionRequest {
            image_base64: request.image_base64.clone(),
            image_url: request.image_url.clone(),
            user_description: Some(request.description.trim().to_string())
                .filter(|d| !d.is_empty()),
            language: request
                .language
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(&self.settings.language)
                .to_string(),
        };

        if !self.gateway.is_available() {
            return Err(DiagnosisError::GatewayUnavailable {
                debug: VisionDebugInfo::for_call(&self.gateway, &vision_request).with_error(
                    "not_configured",
                    "AI vision gateway is not configured",
                    ErrorSource::App,
                ),
            });
        }

        let timeout = self.settings.ai_timeout;
        let call = tokio::time::timeout(timeout, self.gateway.analyze_image(&vision_request));
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DiagnosisError::Cancelled),
            outcome = call => outcome.map_err(|_| DiagnosisError::GatewayCallFailed {
                debug: VisionDebugInfo::for_call(&self.gateway, &vision_request).with_error(
                    "timeout",
                    format!("no answer within {} ms", timeout.as_millis()),
                    ErrorSource::Ai,
                ),
            })?,
        };

        if !response.success {
            return Err(DiagnosisError::GatewayCallFailed {
                debug: response.debug_info,
            });
        }
        let Some(disease_name) = answer::disease_name(&response.content) else {
            return Err(DiagnosisError::GatewayCallFailed {
                debug: response.debug_info.with_error(
                    "empty_content",
                    "AI answer names no disease",
                    ErrorSource::Ai,
                ),
            });
        };

        let entry = self
            .store
            .create_cache_entry(&NewCacheEntry {
                plant_type: query.plant_label.clone(),
                normalized_description: query.normalized.clone(),
                symptom_ids: query.symptom_ids.clone(),
                disease_name: disease_name.clone(),
                ai_response: response.content.clone(),
                expires_at: expiry_after(Utc::now(), self.settings.diagnosis.cache_ttl()),
            })
            .await?;
        tracing::debug!(cache_id = %entry.id, "AI answer cached");

        let mut diagnosis = query.diagnosis(DiagnosisSource::Ai, disease_name);
        diagnosis.cache_id = Some(entry.id);
        diagnosis.hit_count = Some(entry.hit_count);
        diagnosis.ai_response = Some(response.content);
        diagnosis.model = Some(self.gateway.model_name().to_string());
        diagnosis.provider = Some(self.gateway.provider_name().to_string());
        Ok(diagnosis)
    }
}

fn enter(states: &mut Vec<DiagnosisState>, next: DiagnosisState) {
    tracing::trace!(from = ?states.last(), to = ?next, "diagnosis state");
    states.push(next);
}

/// `now + ttl`, capped at the latest expiry the store can hold.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let latest = latest_storable_datetime();
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map_or(latest, |expires| expires.min(latest))
}
