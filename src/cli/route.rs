//! CLI route: single route table over the pipeline. Maps parsed commands
//! onto pipeline calls and presentation; no merge or cache logic lives
//! here.

use crate::cli::parse::Commands;
use crate::cli::presentation;
use crate::error::AppError;
use crate::install;
use crate::normalize::{item_winners, FeatureKind, NormalizedFeature, NormalizedManifest};
use crate::pipeline::Pipeline;
use crate::selection::ChoiceValue;
use crate::settings::{self, Settings};
use dialoguer::{MultiSelect, Select};
use std::path::PathBuf;
use tracing::info;

/// Runtime context for CLI execution: the loaded settings, where they
/// came from, and the offline flag.
pub struct RunContext {
    settings_path: PathBuf,
    settings: Settings,
    offline: bool,
}

impl RunContext {
    /// Create a run context, loading settings from `settings_path` or the
    /// default location when none is given.
    pub fn new(settings_path: Option<PathBuf>, offline: bool) -> Result<Self, AppError> {
        let settings_path = settings_path.unwrap_or_else(settings::default_settings_path);
        let settings = Settings::load(&settings_path)?;
        Ok(Self {
            settings_path,
            settings,
            offline,
        })
    }

    fn pipeline(&self) -> Result<Pipeline, AppError> {
        Ok(Pipeline::with_http(self.settings.clone())?.offline(self.offline))
    }

    /// Execute a command and return its output for stdout.
    pub async fn execute(&mut self, command: &Commands) -> Result<String, AppError> {
        match command {
            Commands::Apply { dry_run } => {
                let summary = self.pipeline()?.apply(*dry_run).await?;
                Ok(presentation::format_apply_summary(&summary))
            }
            Commands::Resolve { format } => {
                let fragments = self.pipeline()?.resolve().await?;
                Ok(match format.as_str() {
                    "json" => presentation::format_fragments_json(&fragments),
                    _ => presentation::format_fragments_text(&fragments),
                })
            }
            Commands::Dump { format } => {
                let dumped = self.pipeline()?.dump().await?;
                Ok(match format.as_str() {
                    "json" => presentation::format_dump_json(&dumped),
                    _ => presentation::format_dump_text(&dumped),
                })
            }
            Commands::List { format } => {
                let pipeline = self.pipeline()?;
                let manifests = pipeline.preprocess().await?;
                let state = pipeline.selection_for(&manifests);
                Ok(match format.as_str() {
                    "json" => presentation::format_item_list_json(&manifests, &state),
                    _ => presentation::format_item_list_text(&manifests, &state),
                })
            }
            Commands::Enable { item } => self.set_enabled(item, true).await,
            Commands::Disable { item } => self.set_enabled(item, false).await,
            Commands::Select {
                item,
                feature,
                values,
            } => self.select(item, feature, values).await,
            Commands::Installs { format } => {
                let targets = install::discover(&self.settings.install);
                Ok(match format.as_str() {
                    "json" => presentation::format_installs_json(&targets),
                    _ => presentation::format_installs_text(&targets),
                })
            }
            Commands::Status { format } => {
                let pipeline = self.pipeline()?;
                let stats = pipeline.cache().stats()?;
                let targets = install::discover(&self.settings.install);
                Ok(match format.as_str() {
                    "json" => {
                        presentation::format_status_json(&self.settings, &stats, &targets)
                    }
                    _ => presentation::format_status_text(&self.settings, &stats, &targets),
                })
            }
        }
    }

    /// Persist an enable/disable override for `item`, after checking it
    /// exists in the loaded manifests.
    async fn set_enabled(&mut self, item: &str, enabled: bool) -> Result<String, AppError> {
        let manifests = self.pipeline()?.preprocess().await?;
        if !item_winners(&manifests).contains_key(item) {
            return Err(AppError::UnknownItem(item.to_string()));
        }
        self.settings.set_item_enabled(item, enabled);
        self.settings.save(&self.settings_path)?;
        info!(item = %item, enabled, "item override persisted");
        Ok(format!(
            "{} {}",
            if enabled { "Enabled" } else { "Disabled" },
            item
        ))
    }

    /// Persist a feature choice for `item`, prompting when no values were
    /// given on the command line.
    async fn select(
        &mut self,
        item: &str,
        feature: &str,
        values: &[String],
    ) -> Result<String, AppError> {
        let manifests = self.pipeline()?.preprocess().await?;
        let target = find_feature(&manifests, item, feature)?;
        let option_names: Vec<String> = target.options.keys().cloned().collect();
        if option_names.is_empty() {
            return Err(AppError::ConfigError(format!(
                "Feature '{}' of '{}' has no options to choose from",
                feature, item
            )));
        }

        let choice = match &target.kind {
            FeatureKind::Single { .. } => {
                let chosen = if values.is_empty() {
                    prompt_single(item, feature, &option_names)?
                } else if values.len() == 1 {
                    values[0].clone()
                } else {
                    return Err(AppError::ConfigError(format!(
                        "Feature '{}' takes exactly one value, got {}",
                        feature,
                        values.len()
                    )));
                };
                check_option(&chosen, &option_names, item, feature)?;
                ChoiceValue::One(chosen)
            }
            FeatureKind::Multi { min, max, .. } => {
                let chosen = if values.is_empty() {
                    prompt_multi(item, feature, &option_names)?
                } else {
                    values.to_vec()
                };
                for value in &chosen {
                    check_option(value, &option_names, item, feature)?;
                }
                if let Some(min) = min {
                    if chosen.len() < *min {
                        return Err(AppError::ConfigError(format!(
                            "Feature '{}' needs at least {} value(s), got {}",
                            feature,
                            min,
                            chosen.len()
                        )));
                    }
                }
                if let Some(max) = max {
                    if chosen.len() > *max {
                        return Err(AppError::ConfigError(format!(
                            "Feature '{}' takes at most {} value(s), got {}",
                            feature,
                            max,
                            chosen.len()
                        )));
                    }
                }
                ChoiceValue::Many(chosen)
            }
        };

        let described = describe_choice(&choice);
        self.settings.set_feature_choice(item, feature, choice);
        self.settings.save(&self.settings_path)?;
        info!(item = %item, feature = %feature, "feature choice persisted");
        Ok(format!("Selected {} for {} of {}", described, feature, item))
    }
}

/// The winning declaration of `feature` on `item`, by the last-loaded rule.
fn find_feature<'a>(
    manifests: &'a [NormalizedManifest],
    item: &str,
    feature: &str,
) -> Result<&'a NormalizedFeature, AppError> {
    let winners = item_winners(manifests);
    let Some(&idx) = winners.get(item) else {
        return Err(AppError::UnknownItem(item.to_string()));
    };
    manifests[idx].items[item]
        .features
        .iter()
        .find(|f| f.name == feature)
        .ok_or_else(|| {
            AppError::ConfigError(format!(
                "Item '{}' has no feature named '{}'",
                item, feature
            ))
        })
}

fn check_option(
    value: &str,
    options: &[String],
    item: &str,
    feature: &str,
) -> Result<(), AppError> {
    if options.iter().any(|o| o == value) {
        return Ok(());
    }
    Err(AppError::ConfigError(format!(
        "Feature '{}' of '{}' has no option '{}' (available: {})",
        feature,
        item,
        value,
        options.join(", ")
    )))
}

fn prompt_single(item: &str, feature: &str, options: &[String]) -> Result<String, AppError> {
    let index = Select::new()
        .with_prompt(format!("Choose an option for {} of {}", feature, item))
        .items(options)
        .default(0)
        .interact()
        .map_err(|e| AppError::ConfigError(format!("Failed to get user input: {}", e)))?;
    Ok(options[index].clone())
}

fn prompt_multi(item: &str, feature: &str, options: &[String]) -> Result<Vec<String>, AppError> {
    let picked = MultiSelect::new()
        .with_prompt(format!("Choose options for {} of {}", feature, item))
        .items(options)
        .interact()
        .map_err(|e| AppError::ConfigError(format!("Failed to get user input: {}", e)))?;
    Ok(picked.into_iter().map(|i| options[i].clone()).collect())
}

fn describe_choice(value: &ChoiceValue) -> String {
    match value {
        ChoiceValue::One(v) => v.clone(),
        ChoiceValue::Many(vs) if vs.is_empty() => "(none)".to_string(),
        ChoiceValue::Many(vs) => vs.join(", "),
    }
}
