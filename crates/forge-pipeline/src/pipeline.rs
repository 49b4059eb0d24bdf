use crate::error::{PipelineDiagnostics, PipelineError, PipelineErrorKind};
use crate::state::{PipelineState, StageTracker, TransitionError};
use std::marker::PhantomData;
use tracing::{debug, info_span};

/// One step of the pipeline. The stage's `DstCtx` is handed to the next
/// stage as its `SrcCtx`, so stage order is fixed by the types.
pub trait PipelineStage: Send + Sync {
    type SrcCtx;
    type DstCtx;

    fn name(&self) -> &'static str;
    /// State the pipeline is in while this stage runs.
    fn state(&self) -> PipelineState;
    fn run(
        &self,
        context: Self::SrcCtx,
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<Self::DstCtx, PipelineError>;
}

type RunFn<Src, Dst> = Box<
    dyn Fn(Src, &mut PipelineDiagnostics, &mut StageTracker) -> Result<Dst, PipelineError>
        + Send
        + Sync,
>;

pub struct Pipeline<Src, Dst> {
    run: RunFn<Src, Dst>,
    states: Vec<PipelineState>,
}

impl<Src, Dst> Pipeline<Src, Dst> {
    /// Runs every stage in order. The first failure aborts the tracker and
    /// is returned as is; later stages never start.
    pub fn run(
        &self,
        context: Src,
        diagnostics: &mut PipelineDiagnostics,
        tracker: &mut StageTracker,
    ) -> Result<Dst, PipelineError> {
        match (self.run)(context, diagnostics, tracker) {
            Ok(output) => Ok(output),
            Err(err) => {
                tracker.abort();
                Err(err)
            }
        }
    }

    pub fn states(&self) -> &[PipelineState] {
        &self.states
    }
}

pub struct PipelineBuilder<Src, Dst> {
    pipeline: Pipeline<Src, Dst>,
    _marker: PhantomData<(Src, Dst)>,
}

impl<Src> PipelineBuilder<Src, Src> {
    pub fn new() -> Self {
        let run = |context: Src,
                   _diagnostics: &mut PipelineDiagnostics,
                   _tracker: &mut StageTracker| Ok(context);
        Self {
            pipeline: Pipeline {
                run: Box::new(run),
                states: Vec::new(),
            },
            _marker: PhantomData,
        }
    }
}

impl<Src> Default for PipelineBuilder<Src, Src> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Src, Mid> PipelineBuilder<Src, Mid> {
    pub fn add_stage<Next, S>(self, stage: S) -> PipelineBuilder<Src, Next>
    where
        S: PipelineStage<SrcCtx = Mid, DstCtx = Next> + 'static,
        Src: 'static,
        Mid: 'static,
        Next: 'static,
    {
        let name = stage.name();
        let state = stage.state();
        let previous = self.pipeline.run;
        let mut states = self.pipeline.states;
        states.push(state);
        let run = move |context: Src,
                        diagnostics: &mut PipelineDiagnostics,
                        tracker: &mut StageTracker| {
            let mid = previous(context, diagnostics, tracker)?;
            tracker.advance(state).map_err(|err| {
                PipelineError::new(name, PipelineErrorKind::Compilation, err.to_string())
            })?;
            let span = info_span!("pipeline.stage", stage = name);
            let _enter = span.enter();
            debug!("stage started");
            let result = stage.run(mid, diagnostics);
            // Tool output is surfaced whether or not the stage succeeded.
            diagnostics.emit_stage(name);
            match result {
                Ok(next) => {
                    debug!("stage finished");
                    Ok(next)
                }
                Err(err) if err.stage == name => Err(err),
                Err(err) => Err(PipelineError {
                    stage: name,
                    ..err
                }),
            }
        };

        PipelineBuilder {
            pipeline: Pipeline {
                run: Box::new(run),
                states,
            },
            _marker: PhantomData,
        }
    }

    /// Finishes the pipeline, checking that its stages walk the state
    /// machine from `Idle` without skipping or repeating a state.
    pub fn build(self) -> Result<Pipeline<Src, Mid>, TransitionError> {
        let mut tracker = StageTracker::new();
        for state in &self.pipeline.states {
            tracker.advance(*state)?;
        }
        Ok(self.pipeline)
    }
}
