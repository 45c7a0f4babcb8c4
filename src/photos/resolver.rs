use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::photos::provider::{Attribution, PhotoCandidate, PhotoProvider};
use crate::photos::recent::RecentImages;
use crate::utils::timing::log_provider_timing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub id: String,
    pub url: String,
    pub attribution: Option<Attribution>,
    pub query: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no usable photo after {calls} provider call(s); last failure: {}", .last_failure.as_deref().unwrap_or("none"))]
    NotFound {
        calls: usize,
        last_failure: Option<String>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub attempts_per_query: usize,
}

enum Step {
    TryTerm { term: usize },
    TryAttempt { term: usize, attempt: usize },
    Accept { term: usize, photo: PhotoCandidate, url: String },
    NextTerm { term: usize },
    Exhausted,
}

enum AttemptOutcome {
    Accepted { photo: PhotoCandidate, url: String },
    Retry(String),
    Abandon(String),
}

pub struct ImageResolver {
    provider: Arc<dyn PhotoProvider>,
    recent: Arc<Mutex<RecentImages>>,
    settings: ResolverSettings,
}

impl ImageResolver {
    pub fn new(
        provider: Arc<dyn PhotoProvider>,
        recent: Arc<Mutex<RecentImages>>,
        settings: ResolverSettings,
    ) -> Self {
        ImageResolver {
            provider,
            recent,
            settings: ResolverSettings {
                attempts_per_query: settings.attempts_per_query.max(1),
            },
        }
    }

    pub fn recent(&self) -> &Arc<Mutex<RecentImages>> {
        &self.recent
    }

    /// Walks `terms` once, in order, making at most `attempts_per_query` calls per term.
    pub async fn resolve(&self, terms: &[String]) -> Result<ResolvedImage, ResolveError> {
        let mut calls = 0usize;
        let mut last_failure: Option<String> = None;
        let mut step = Step::TryTerm { term: 0 };

        loop {
            step = match step {
                Step::TryTerm { term } => {
                    if term >= terms.len() {
                        Step::Exhausted
                    } else {
                        Step::TryAttempt { term, attempt: 0 }
                    }
                }
                Step::TryAttempt { term, attempt } => {
                    if attempt >= self.settings.attempts_per_query {
                        Step::NextTerm { term }
                    } else {
                        let query = terms[term].as_str();
                        calls += 1;
                        match self.attempt(query, attempt + 1).await {
                            AttemptOutcome::Accepted { photo, url } => {
                                Step::Accept { term, photo, url }
                            }
                            AttemptOutcome::Retry(reason) => {
                                debug!("Retrying query={} after: {}", query, reason);
                                last_failure = Some(reason);
                                Step::TryAttempt {
                                    term,
                                    attempt: attempt + 1,
                                }
                            }
                            AttemptOutcome::Abandon(reason) => {
                                warn!("Abandoning query={} after: {}", query, reason);
                                last_failure = Some(reason);
                                Step::NextTerm { term }
                            }
                        }
                    }
                }
                Step::Accept { term, photo, url } => {
                    info!(
                        "Resolved photo id={} for query={} after {} call(s)",
                        photo.id, terms[term], calls
                    );
                    return Ok(ResolvedImage {
                        id: photo.id,
                        url,
                        attribution: photo.attribution,
                        query: terms[term].clone(),
                    });
                }
                Step::NextTerm { term } => Step::TryTerm { term: term + 1 },
                Step::Exhausted => {
                    return Err(ResolveError::NotFound {
                        calls,
                        last_failure,
                    });
                }
            };
        }
    }

    async fn attempt(&self, query: &str, attempt: usize) -> AttemptOutcome {
        let result = log_provider_timing(self.provider.name(), query, attempt, || {
            self.provider.random_photos(query)
        })
        .await;

        let candidates = match result {
            Ok(candidates) => candidates,
            Err(err) if err.is_denied() => return AttemptOutcome::Abandon(err.to_string()),
            Err(err) => return AttemptOutcome::Retry(err.to_string()),
        };
        if candidates.is_empty() {
            return AttemptOutcome::Retry("empty payload".to_string());
        }

        let mut saw_repeat = false;
        let mut recent = self.recent.lock();
        for photo in candidates {
            let Some(url) = photo.preferred_url().map(str::to_string) else {
                debug!("Photo id={} for query={} has no usable URL", photo.id, query);
                continue;
            };
            if !recent.claim(&photo.id) {
                info!("Photo id={} was served recently, skipping", photo.id);
                saw_repeat = true;
                continue;
            }
            debug!("Recently served cache now holds {} id(s)", recent.len());
            return AttemptOutcome::Accepted { photo, url };
        }

        if saw_repeat {
            AttemptOutcome::Retry("only recently served photos returned".to_string())
        } else {
            AttemptOutcome::Retry("no photo with a usable URL".to_string())
        }
    }
}
