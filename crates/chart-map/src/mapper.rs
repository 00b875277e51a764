//! Channel binding.
//!
//! Channels are bound one at a time, required ones first, each to the best
//! remaining column. A classifier proposal is tried before the heuristic
//! ranking; a proposal that does not fit is dropped with a warning.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use chart_common::{CaseInsensitiveSet, normalize_text};
use chart_model::{Channel, ChannelSpec, ColumnProfile, DataProfile, MappingConfig, TemplateSpec};
use polars::prelude::DataFrame;
use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;

use crate::error::{MappingError, Result};
use crate::fit::{Coercion, Fit, Rejection, apply_coercion, assess};

/// Table and bindings after mapping.
#[derive(Debug, Clone)]
pub struct MappedTable {
    /// Input table with converted columns replaced.
    pub df: DataFrame,
    pub mapping: MappingConfig,
    /// Conversions applied per bound column.
    pub coercions: BTreeMap<String, Coercion>,
    pub warnings: Vec<String>,
}

/// Binds table columns to a template's encoding channels.
///
/// # Example
///
/// ```ignore
/// let mapped = DataMapper::new(&template)
///     .with_intent_terms(intent_terms("sales by month"))
///     .map(df, &profile)?;
/// ```
#[derive(Debug, Clone)]
pub struct DataMapper<'a> {
    template: &'a TemplateSpec,
    intent_terms: Vec<String>,
    proposal: Option<MappingConfig>,
}

type Binding = (String, Option<Coercion>);

struct Candidate<'p> {
    column: &'p ColumnProfile,
    position: usize,
    fit: Fit,
    similarity: f64,
}

impl<'a> DataMapper<'a> {
    pub fn new(template: &'a TemplateSpec) -> Self {
        Self {
            template,
            intent_terms: Vec::new(),
            proposal: None,
        }
    }

    /// Terms used to break ties between equally suitable columns.
    #[must_use]
    pub fn with_intent_terms(mut self, terms: Vec<String>) -> Self {
        self.intent_terms = terms;
        self
    }

    /// Bindings suggested by the classifier, tried before the heuristic.
    #[must_use]
    pub fn with_proposal(mut self, proposal: MappingConfig) -> Self {
        self.proposal = Some(proposal);
        self
    }

    /// Binds every channel of the template.
    ///
    /// `profile` must describe `df`. Fails only when a required channel
    /// cannot be bound; unbound optional channels become warnings.
    pub fn map(&self, df: DataFrame, profile: &DataProfile) -> Result<MappedTable> {
        let start = Instant::now();
        let mut df = df;
        let mut mapping = MappingConfig::new();
        let mut coercions = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut missing = Vec::new();

        let columns: Vec<(usize, &ColumnProfile)> = profile
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| df.column(&column.name).is_ok())
            .collect();
        let lookup = CaseInsensitiveSet::new(columns.iter().map(|(_, column)| &column.name));

        if let Some(proposal) = &self.proposal {
            for (channel, _) in proposal.iter() {
                if self.template.channel_spec(channel).is_none() {
                    warnings.push(format!(
                        "Proposed channel '{channel}' is not used by template '{}'",
                        self.template.id
                    ));
                }
            }
        }

        for (spec, required) in self.template.channels() {
            let used: Vec<&str> = mapping.iter().map(|(_, column)| column).collect();
            let proposed = self.proposal.as_ref().and_then(|p| p.get(spec.channel));

            let mut bound = None;
            if let Some(name) = proposed {
                match self.try_proposed(&mut df, &columns, &lookup, &used, spec, name)? {
                    Ok(choice) => bound = Some(choice),
                    Err(reason) => warnings.push(format!(
                        "Proposed column '{name}' for '{}' was rejected: {reason}",
                        spec.channel
                    )),
                }
            }
            if bound.is_none() {
                bound = self.best_candidate(&mut df, &columns, &used, spec, &mut warnings)?;
            }

            match bound {
                Some((column, coercion)) => {
                    if let Some(coercion) = coercion {
                        coercions.insert(column.clone(), coercion);
                    }
                    mapping.bind(spec.channel, column);
                }
                None if required => missing.push(spec.clone()),
                None => warnings.push(format!(
                    "Optional channel '{}' left unbound: no compatible column",
                    spec.channel
                )),
            }
        }

        if !missing.is_empty() {
            tracing::debug!(
                template = %self.template.id,
                missing = missing.len(),
                "required channels unbound"
            );
            return Err(MappingError::MissingRequired {
                template: self.template.id.clone(),
                missing,
                available: columns.iter().map(|(_, c)| c.name.clone()).collect(),
            });
        }

        tracing::debug!(
            template = %self.template.id,
            channels = mapping.len(),
            coerced = coercions.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "mapped columns"
        );

        Ok(MappedTable {
            df,
            mapping,
            coercions,
            warnings,
        })
    }

    /// Validates a proposed column; `Err` carries the reason it was refused.
    fn try_proposed(
        &self,
        df: &mut DataFrame,
        columns: &[(usize, &ColumnProfile)],
        lookup: &CaseInsensitiveSet,
        used: &[&str],
        spec: &ChannelSpec,
        name: &str,
    ) -> Result<std::result::Result<Binding, String>> {
        let Some(actual) = lookup.get(name) else {
            return Ok(Err("column not found".to_string()));
        };
        if used.contains(&actual) {
            return Ok(Err("column is already bound".to_string()));
        }
        let Some((_, column)) = columns.iter().find(|(_, c)| c.name == actual) else {
            return Ok(Err("column not found".to_string()));
        };
        let fit = match assess(column, spec) {
            Ok(fit) => fit,
            Err(rejection) => return Ok(Err(rejection.to_string())),
        };
        if let Some(coercion) = fit.coercion
            && !apply_coercion(df, actual, coercion)?
        {
            return Ok(Err(Rejection::LosesValues.to_string()));
        }
        Ok(Ok((actual.to_string(), fit.coercion)))
    }

    /// Best unused column for `spec`, converting it when needed.
    fn best_candidate(
        &self,
        df: &mut DataFrame,
        columns: &[(usize, &ColumnProfile)],
        used: &[&str],
        spec: &ChannelSpec,
        warnings: &mut Vec<String>,
    ) -> Result<Option<Binding>> {
        let mut candidates: Vec<Candidate<'_>> = columns
            .iter()
            .filter(|(_, column)| !used.contains(&column.name.as_str()))
            .filter_map(|(position, column)| {
                assess(column, spec).ok().map(|fit| Candidate {
                    column: *column,
                    position: *position,
                    fit,
                    similarity: self.name_similarity(&column.name),
                })
            })
            .collect();
        candidates.sort_by(compare_candidates);

        for candidate in candidates {
            let name = candidate.column.name.as_str();
            if let Some(coercion) = candidate.fit.coercion
                && !apply_coercion(df, name, coercion)?
            {
                warnings.push(format!(
                    "Column '{name}' skipped for '{}': {}",
                    spec.channel,
                    Rejection::LosesValues
                ));
                continue;
            }
            return Ok(Some((name.to_string(), candidate.fit.coercion)));
        }
        Ok(None)
    }

    fn name_similarity(&self, column: &str) -> f64 {
        let normalized = normalize_text(column);
        self.intent_terms
            .iter()
            .map(|term| jaro_similarity(normalized.chars(), term.chars()))
            .fold(0.0, f64::max)
    }
}

/// Direct before coerced, then type preference, then name similarity, then position.
fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    b.fit
        .is_direct()
        .cmp(&a.fit.is_direct())
        .then(a.fit.preference.cmp(&b.fit.preference))
        .then(b.similarity.total_cmp(&a.similarity))
        .then(a.position.cmp(&b.position))
}

/// Channels of `template` bound in `mapping`, in template order.
pub fn bound_channels(template: &TemplateSpec, mapping: &MappingConfig) -> Vec<Channel> {
    template
        .channels()
        .map(|(spec, _)| spec.channel)
        .filter(|channel| mapping.contains(*channel))
        .collect()
}
