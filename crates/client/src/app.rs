//! Interactive terminal loop.
//!
//! The app is generic over its input and output so the whole loop can be
//! driven from memory in tests.
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use fireatwill_core::{
    AllyDecision, EnemyAction, MatchOutcome, ShotResult, TurnRecord, Visibility,
};
use fireatwill_runtime::{
    InterpretationOracle, MatchEvent, MatchRuntime, OracleCall, RuntimeError, TurnInput,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::config::ClientConfig;
use crate::session::Session;

const INJECT_PREFIX: &str = "!enemy";
const DEGRADED_NOTICE: &str =
    "The ally could not be reached this turn, defaulting to cautious behavior.";

pub struct App<R, W> {
    config: ClientConfig,
    session_id: String,
    oracle: Arc<dyn InterpretationOracle>,
    input: Lines<R>,
    output: W,
}

impl<R, W> App<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        config: ClientConfig,
        session_id: String,
        oracle: Arc<dyn InterpretationOracle>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            config,
            session_id,
            oracle,
            input: input.lines(),
            output,
        }
    }

    /// Plays one match to completion and returns how it ended.
    ///
    /// Rejected orders are reported and the loop continues; fatal runtime
    /// errors end the session.
    pub async fn run(mut self) -> Result<MatchOutcome> {
        writeln!(self.output, "FIRE AT WILL")?;
        writeln!(
            self.output,
            "Your ally reads every order you send, and so does the enemy."
        )?;
        write!(
            self.output,
            "Declare your lore frame for this match (blank for none): "
        )?;
        self.output.flush()?;
        let frame = self.next_line().await?.unwrap_or_default();

        let session = Session::start(
            &self.config,
            self.session_id.clone(),
            Some(&frame),
            Arc::clone(&self.oracle),
        )?;
        let Session {
            mut runtime,
            log_path,
            ..
        } = session;
        let mut events = runtime.subscribe_events();
        let mut injection: Option<String> = None;

        while !runtime.is_finished() {
            self.render_turn_header(&runtime)?;
            write!(self.output, "Orders > ")?;
            self.output.flush()?;

            let Some(line) = self.next_line().await? else {
                writeln!(self.output)?;
                self.quit(&mut runtime)?;
                break;
            };
            let line = line.trim();

            if matches!(line, "q" | "quit") {
                self.quit(&mut runtime)?;
                break;
            }
            if let Some(text) = line.strip_prefix(INJECT_PREFIX) {
                let text = text.trim();
                if text.is_empty() {
                    writeln!(self.output, "Usage: {INJECT_PREFIX} <message>")?;
                } else {
                    writeln!(self.output, "Enemy message queued for this turn.")?;
                    injection = Some(text.to_string());
                }
                continue;
            }

            let mut input = TurnInput::new(line);
            if let Some(text) = injection.take() {
                input = input.with_injection(text);
            }

            match runtime.play_turn(input).await {
                Ok(record) => {
                    let ally_degraded = drain_ally_degraded(&mut events);
                    self.report(&runtime, &record, ally_degraded)?;
                }
                Err(error) if error.is_fatal() => return Err(error.into()),
                Err(RuntimeError::MatchAborted { .. } | RuntimeError::MatchFinished { .. }) => {
                    break;
                }
                Err(error) => {
                    tracing::debug!(%error, "order rejected");
                    writeln!(self.output, "Order rejected: {error}")?;
                }
            }
        }

        if let Some(path) = log_path {
            writeln!(self.output, "Turn log saved to {}", path.display())?;
        }
        Ok(runtime.outcome())
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.input.next_line().await?)
    }

    fn quit(&mut self, runtime: &mut MatchRuntime) -> Result<()> {
        runtime.abort()?;
        announce(&mut self.output, MatchOutcome::Aborted)?;
        Ok(())
    }

    fn render_turn_header(&mut self, runtime: &MatchRuntime) -> Result<()> {
        let state = runtime.state();
        writeln!(self.output)?;
        write!(self.output, "Turn {}", state.turn().index + 1)?;
        if let Some(frame) = state.declared_frame() {
            write!(self.output, " | frame: {frame}")?;
        }
        if let Some(leading) = state.belief().leading() {
            write!(
                self.output,
                " | enemy suspects: {} ({:.0}%)",
                leading.candidate,
                leading.weight * 100.0
            )?;
        }
        writeln!(self.output)?;
        write!(
            self.output,
            "{}",
            state.project(Visibility::Player).render_with_legend()
        )?;
        Ok(())
    }

    fn report(
        &mut self,
        runtime: &MatchRuntime,
        record: &TurnRecord,
        ally_degraded: bool,
    ) -> Result<()> {
        writeln!(self.output, "Enemy: {}", describe_enemy(&record.enemy_action))?;
        if ally_degraded {
            writeln!(self.output, "{DEGRADED_NOTICE}")?;
        }
        writeln!(self.output, "Ally: {}", describe_ally(&record.ally_decision))?;
        if let Some(result) = describe_shot(&record.shot) {
            writeln!(self.output, "{result}")?;
        }

        writeln!(self.output, "What your ally has seen:")?;
        write!(
            self.output,
            "{}",
            runtime.state().project(Visibility::Ally).render_with_legend()
        )?;
        writeln!(
            self.output,
            "state {}",
            hex::encode(&record.digest[..4])
        )?;

        if record.outcome.is_terminal() {
            announce(&mut self.output, record.outcome)?;
        }
        Ok(())
    }
}

/// Consumes pending events; true if the ally's call fell back this turn.
fn drain_ally_degraded(events: &mut broadcast::Receiver<MatchEvent>) -> bool {
    let mut degraded = false;
    loop {
        match events.try_recv() {
            Ok(MatchEvent::OracleDegraded {
                call: OracleCall::Ally,
                ..
            }) => degraded = true,
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    degraded
}

fn describe_enemy(action: &EnemyAction) -> String {
    match action {
        EnemyAction::Reposition { entity, from, to } => {
            format!("moved {entity} from {from} to {to}")
        }
        EnemyAction::DeployChaff { cell } => format!("deployed chaff over {cell}"),
        EnemyAction::NoAction => "held position".to_string(),
    }
}

fn describe_ally(decision: &AllyDecision) -> String {
    match decision {
        AllyDecision::Fire(cell) => format!("fires at {cell}"),
        AllyDecision::Hold => "holds fire".to_string(),
    }
}

fn describe_shot(shot: &ShotResult) -> Option<String> {
    match shot {
        ShotResult::Held => None,
        ShotResult::Blocked { cell } => Some(format!("The shot at {cell} was blocked by chaff.")),
        ShotResult::Miss { cell } => Some(format!("Miss at {cell}.")),
        ShotResult::ShipDestroyed { cell, .. } => Some(format!("Ship destroyed at {cell}!")),
        ShotResult::HostageStruck { cell, .. } => Some(format!("A hostage was struck at {cell}.")),
    }
}

fn announce(output: &mut impl Write, outcome: MatchOutcome) -> Result<()> {
    let message = match outcome {
        MatchOutcome::Ongoing => return Ok(()),
        MatchOutcome::ShipsAllDestroyed => "Victory: every enemy ship is destroyed.",
        MatchOutcome::EnemyAssetsExhausted => "Victory: the enemy has no ships left.",
        MatchOutcome::HostageStruck => "Defeat: a hostage was struck.",
        MatchOutcome::TurnLimitReached => "The turn limit was reached and the enemy slipped away.",
        MatchOutcome::Aborted => "Match aborted.",
    };
    writeln!(output, "{message}")?;
    Ok(())
}
