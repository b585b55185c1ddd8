//! The per-script orchestration loop: substitute, resolve,
//! repair-retry-once, execute, store output, continue or fail.

use std::{
    path::{Path, PathBuf},
    sync::{atomic::{AtomicBool, Ordering}, Arc},
};

use browserlet_dom::BrowserDriver;
use browserlet_executor::{execute, ActionOutcome, ExecutionContext};
use browserlet_protocol::{ExitCode, FailureDiagnostic, Script};
use browserlet_repair::{ApplyPolicy, RepairEngine, RepairOutcome, RepairSuggestion};
use browserlet_resolver::{resolve as resolve_target, MicroPromptProvider};
use browserlet_vault::PasswordStorage;
use tracing::{info, warn};

use crate::{
    config::RunnerConfig,
    error::Result,
    events::{EventSender, RunnerEvent},
    micro_prompt::LlmMicroPrompt,
    session::SessionLedger,
    substitution::{self, SubstitutionError},
    variables::ExtractedVariables,
};

/// What happened to one step, for accumulation into a `--diagnostic-json`
/// report.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// The step succeeded.
    Succeeded,
    /// The step was skipped because a prior run's session ledger already
    /// recorded it as succeeded.
    SkippedAlreadySucceeded,
    /// The step failed.
    Failed {
        /// The resolver's diagnostic, when resolution was the cause.
        diagnostic: Option<Box<FailureDiagnostic>>,
        /// A human-readable summary.
        message: String,
        /// Path to a best-effort screenshot taken at the point of failure.
        screenshot: Option<PathBuf>,
    },
}

/// The outcome of running an entire script.
pub struct RunResult {
    /// The run's exit code.
    pub exit_code: ExitCode,
    /// Variables extracted over the course of the run.
    pub variables: ExtractedVariables,
    /// Per-step outcomes, in script order.
    pub step_outcomes: Vec<(String, StepOutcome)>,
}

/// Orchestrates one script run against one `BrowserDriver`.
pub struct Runner {
    config: RunnerConfig,
    vault: Option<Arc<dyn PasswordStorage>>,
    repair_engine: RepairEngine,
    micro_prompt: Option<LlmMicroPrompt>,
    events: EventSender,
    cancel: Arc<AtomicBool>,
}

impl Runner {
    /// Build a runner. `micro_prompt_handle` is the Tokio runtime handle the
    /// resolver's optional stage-4 hook blocks on; pass `None` when
    /// `config.micro_prompts` is false.
    pub fn new(
        config: RunnerConfig,
        vault: Option<Arc<dyn PasswordStorage>>,
        events: EventSender,
        cancel: Arc<AtomicBool>,
        micro_prompt_handle: Option<tokio::runtime::Handle>,
    ) -> Self {
        let repair_engine = if config.repair_enabled() {
            match config.build_repair_provider() {
                Some(provider) => {
                    let policy = if config.auto_repair {
                        ApplyPolicy::Auto
                    } else {
                        ApplyPolicy::Interactive
                    };
                    RepairEngine::new(provider, policy)
                }
                None => RepairEngine::disabled(),
            }
        } else {
            RepairEngine::disabled()
        };

        let micro_prompt = match (config.micro_prompts, config.llm_provider.clone(), micro_prompt_handle) {
            (true, Some(provider), Some(handle)) => Some(LlmMicroPrompt::new(provider, handle)),
            _ => None,
        };

        Self {
            config,
            vault,
            repair_engine,
            micro_prompt,
            events,
            cancel,
        }
    }

    fn emit(&self, event: RunnerEvent) {
        let _ = self.events.try_send(event);
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Run every step of `script`, driving `driver`, confirming repair
    /// suggestions under `ApplyPolicy::Interactive` via `confirm_repair`.
    ///
    /// `script_path` must point at the on-disk `.bsl` file so repairs can be
    /// written back in place; `session_id`, when set, both gates which
    /// steps are skipped and records newly-succeeded ones.
    pub fn run_script(
        &self,
        driver: &dyn BrowserDriver,
        script: &mut Script,
        script_path: &Path,
        confirm_repair: impl Fn(&RepairSuggestion) -> bool,
    ) -> Result<RunResult> {
        let mut variables = ExtractedVariables::new();
        let mut step_outcomes = Vec::with_capacity(script.steps.len());

        let mut ledger = match &self.config.session_restore {
            Some(session_id) => Some(SessionLedger::load_or_new(
                &self.config.output_dir,
                &script.name,
                session_id,
            )?),
            None => None,
        };

        let mut worst_exit = ExitCode::Success;

        for index in 0..script.steps.len() {
            if self.cancelled() {
                worst_exit = worse(worst_exit, ExitCode::Infrastructure);
                break;
            }

            let step_id = script.steps[index].effective_id(index);

            if let Some(ledger) = &ledger {
                if ledger.already_succeeded(&step_id) {
                    step_outcomes.push((step_id, StepOutcome::SkippedAlreadySucceeded));
                    continue;
                }
            }

            self.emit(RunnerEvent::StepStarted { step_id: step_id.clone(), index });

            match self.run_step(driver, script, index, &step_id, script_path, &mut variables, &confirm_repair) {
                Ok(()) => {
                    self.emit(RunnerEvent::StepSucceeded { step_id: step_id.clone() });
                    if let Some(ledger) = &mut ledger {
                        ledger.mark_succeeded(&self.config.output_dir, &script.name, &step_id)?;
                    }
                    step_outcomes.push((step_id, StepOutcome::Succeeded));
                }
                Err(failure) => {
                    let screenshot = best_effort_screenshot(driver, &self.config.output_dir, &script.name, &step_id);
                    self.emit(RunnerEvent::StepFailed {
                        step_id: step_id.clone(),
                        diagnostic: failure.diagnostic.clone(),
                        message: failure.message.clone(),
                    });
                    worst_exit = worse(worst_exit, failure.exit_code);
                    step_outcomes.push((
                        step_id,
                        StepOutcome::Failed {
                            diagnostic: failure.diagnostic,
                            message: failure.message,
                            screenshot,
                        },
                    ));
                    break;
                }
            }
        }

        self.emit(RunnerEvent::RunFinished { exit_code: worst_exit });
        Ok(RunResult {
            exit_code: worst_exit,
            variables,
            step_outcomes,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        &self,
        driver: &dyn BrowserDriver,
        script: &mut Script,
        index: usize,
        step_id: &str,
        script_path: &Path,
        variables: &mut ExtractedVariables,
        confirm_repair: &impl Fn(&RepairSuggestion) -> bool,
    ) -> std::result::Result<(), StepFailure> {
        let timeout = script.steps[index]
            .timeout_duration(self.config.global_timeout)
            .map_err(|e| StepFailure::action(e.to_string()))?;

        let substituted_value = match &script.steps[index].value {
            Some(raw) => Some(
                substitution::substitute(raw, step_id, self.vault.as_deref(), variables)
                    .map_err(StepFailure::from_substitution)?,
            ),
            None => None,
        };

        let action = script.steps[index].action;
        let has_target = script.steps[index].target.is_some();

        let resolved = if action.requires_target(has_target) {
            let resolution = self.resolve_with_repair(driver, script, index, step_id, script_path, confirm_repair)?;
            Some(resolution)
        } else {
            None
        };

        let output = script.steps[index].output.clone();
        let ctx = ExecutionContext {
            driver,
            output_dir: &self.config.output_dir,
            script_name: &script.name,
        };

        let outcome = execute(
            &ctx,
            action,
            resolved.as_ref(),
            substituted_value.as_deref(),
            output.as_ref(),
            timeout,
            step_id,
        )
        .map_err(StepFailure::from_executor)?;

        if let Some(output) = output {
            if let Some(value) = outcome_to_value(outcome) {
                variables.set(output.variable, value);
            }
        }

        Ok(())
    }

    /// Resolve the step's target; on failure, attempt one repair-and-retry
    /// cycle if the repair engine is configured.
    fn resolve_with_repair(
        &self,
        driver: &dyn BrowserDriver,
        script: &mut Script,
        index: usize,
        step_id: &str,
        script_path: &Path,
        confirm_repair: &impl Fn(&RepairSuggestion) -> bool,
    ) -> std::result::Result<browserlet_dom::ResolvedElement, StepFailure> {
        let provider: Option<&dyn MicroPromptProvider> =
            self.micro_prompt.as_ref().map(|p| p as &dyn MicroPromptProvider);

        let target = script.steps[index].target.clone().expect("requires_target implies Some");
        let diagnostic = match resolve_target(driver, &target, step_id, &self.config.resolver, provider)
            .map_err(StepFailure::from_dom)?
        {
            Ok(resolution) => {
                self.emit(RunnerEvent::StepResolved {
                    step_id: step_id.to_string(),
                    stage: resolution.stage,
                    confidence: resolution.confidence,
                });
                return Ok(resolution.element);
            }
            Err(diagnostic) => diagnostic,
        };

        if !self.repair_engine.is_configured() {
            return Err(StepFailure::resolution(diagnostic));
        }

        let step = script.steps[index].clone();
        let repair_outcome = tokio::runtime::Handle::current().block_on(self.repair_engine.repair(
            script_path,
            index,
            &step,
            &diagnostic,
            confirm_repair,
        ));

        let new_hints = match repair_outcome {
            RepairOutcome::Applied { new_hints } => {
                self.emit(RunnerEvent::RepairAttempted { step_id: step_id.to_string(), applied: true });
                new_hints
            }
            RepairOutcome::NotApplied => {
                self.emit(RunnerEvent::RepairAttempted { step_id: step_id.to_string(), applied: false });
                return Err(StepFailure::resolution(diagnostic));
            }
        };

        script.steps[index].target.as_mut().expect("requires_target implies Some").hints = new_hints;
        let retried_target = script.steps[index].target.clone().expect("requires_target implies Some");

        match resolve_target(driver, &retried_target, step_id, &self.config.resolver, provider)
            .map_err(StepFailure::from_dom)?
        {
            Ok(resolution) => {
                info!(step_id, "resolved after repair retry");
                self.emit(RunnerEvent::StepResolved {
                    step_id: step_id.to_string(),
                    stage: resolution.stage,
                    confidence: resolution.confidence,
                });
                Ok(resolution.element)
            }
            Err(second_diagnostic) => Err(StepFailure::resolution(second_diagnostic)),
        }
    }
}

/// Why a step failed, and which exit code it maps to.
struct StepFailure {
    exit_code: ExitCode,
    message: String,
    diagnostic: Option<Box<FailureDiagnostic>>,
}

impl StepFailure {
    fn action(message: impl Into<String>) -> Self {
        Self { exit_code: ExitCode::StepFailure, message: message.into(), diagnostic: None }
    }

    fn resolution(diagnostic: FailureDiagnostic) -> Self {
        let message = diagnostic
            .suggestion
            .clone()
            .unwrap_or_else(|| "resolution failed".to_string());
        Self { exit_code: ExitCode::StepFailure, message, diagnostic: Some(Box::new(diagnostic)) }
    }

    fn from_substitution(err: SubstitutionError) -> Self {
        Self { exit_code: ExitCode::StepFailure, message: err.to_string(), diagnostic: None }
    }

    fn from_executor(err: browserlet_executor::Error) -> Self {
        let exit_code = match err {
            browserlet_executor::Error::Timeout { .. } => ExitCode::Infrastructure,
            _ => ExitCode::StepFailure,
        };
        Self { exit_code, message: err.to_string(), diagnostic: None }
    }

    fn from_dom(err: browserlet_dom::Error) -> Self {
        Self { exit_code: ExitCode::Infrastructure, message: err.to_string(), diagnostic: None }
    }
}

fn worse(a: ExitCode, b: ExitCode) -> ExitCode {
    fn rank(e: ExitCode) -> u8 {
        match e {
            ExitCode::Success => 0,
            ExitCode::StepFailure => 1,
            ExitCode::Infrastructure => 2,
            ExitCode::Skipped => 3,
        }
    }
    if rank(b) > rank(a) { b } else { a }
}

fn outcome_to_value(outcome: ActionOutcome) -> Option<serde_json::Value> {
    match outcome {
        ActionOutcome::None => None,
        ActionOutcome::Extracted(text) => Some(serde_json::Value::String(text)),
        ActionOutcome::ExtractedTable(records) => Some(serde_json::to_value(records).unwrap_or(serde_json::Value::Null)),
        ActionOutcome::Screenshot(path) => Some(serde_json::Value::String(path.display().to_string())),
    }
}

fn best_effort_screenshot(
    driver: &dyn BrowserDriver,
    output_dir: &Path,
    script_name: &str,
    step_id: &str,
) -> Option<PathBuf> {
    let path = output_dir.join(format!("{script_name}_{step_id}_failure.png"));
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match driver.screenshot(&path) {
        Ok(()) => Some(path),
        Err(err) => {
            warn!(error = %err, "best-effort failure screenshot could not be taken");
            None
        }
    }
}
