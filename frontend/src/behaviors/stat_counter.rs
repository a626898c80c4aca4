use std::collections::HashMap;

use crate::config::{selectors, BehaviorConfig};
use crate::dom::{Dom, NodeId};
use crate::error::{BehaviorError, Result};
use crate::events::{Deferred, EventKind, ObserverKind, ObserverOptions, PageEvent};
use crate::page::{Behavior, Context, TriggerRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    Percent,
    Plus,
}

impl Suffix {
    /// Percentages stay percentages; every other figure reads as "N+".
    pub fn for_text(text: &str) -> Self {
        if text.contains('%') {
            Suffix::Percent
        } else {
            Suffix::Plus
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Suffix::Percent => "%",
            Suffix::Plus => "+",
        }
    }
}

/// Leading integer of `text`: optional whitespace, an optional sign, then
/// digits. Anything after the digits is ignored.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|value| sign * value)
}

/// Fraction of the animation completed after `elapsed` milliseconds.
pub fn progress(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountUp {
    pub target: i64,
    pub suffix: Suffix,
    started_at: Option<f64>,
}

impl CountUp {
    pub fn from_text(text: &str) -> Option<Self> {
        Some(Self {
            target: parse_leading_int(text)?,
            suffix: Suffix::for_text(text),
            started_at: None,
        })
    }

    pub fn value_at(&self, progress: f64) -> i64 {
        (progress * self.target as f64).floor() as i64
    }

    pub fn render(&self, value: i64) -> String {
        format!("{}{}", value, self.suffix.as_str())
    }

    /// Advances to the frame at `timestamp`, returning the text to show and
    /// whether the run has finished. The first frame anchors the clock.
    pub fn frame(&mut self, timestamp: f64, duration: f64) -> (String, bool) {
        let started = *self.started_at.get_or_insert(timestamp);
        let progress = progress(timestamp - started, duration);
        (self.render(self.value_at(progress)), progress >= 1.0)
    }
}

/// Counts numeric stats up from zero the first time they become visible.
pub struct StatCounterAnimator {
    duration_ms: f64,
    counted: TriggerRecord,
    runs: HashMap<NodeId, CountUp>,
}

impl StatCounterAnimator {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            duration_ms: f64::from(config.count_up_duration_ms),
            counted: TriggerRecord::default(),
            runs: HashMap::new(),
        }
    }

    fn start(&mut self, node: NodeId, ctx: &mut Context<'_>) {
        if !self.counted.trigger(node) {
            return;
        }
        ctx.unobserve(ObserverKind::StatCounter, node);

        let text = ctx.dom().text(node).unwrap_or_default();
        match CountUp::from_text(&text) {
            Some(run) => {
                self.runs.insert(node, run);
                ctx.request_frame(Deferred::CountFrame(node));
            }
            None => log::warn!("Stat {} has no leading number: {:?}", node, text.trim()),
        }
    }

    fn step(&mut self, node: NodeId, timestamp: f64, ctx: &mut Context<'_>) -> Result<()> {
        let Some(run) = self.runs.get_mut(&node) else {
            return Ok(());
        };
        let (text, finished) = run.frame(timestamp, self.duration_ms);
        if finished {
            self.runs.remove(&node);
        } else {
            ctx.request_frame(Deferred::CountFrame(node));
        }
        ctx.dom().set_text(node, &text)
    }
}

impl Behavior for StatCounterAnimator {
    fn name(&self) -> &'static str {
        "stat-counter"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Intersection, EventKind::Deferred]
    }

    fn mount(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        let stats = ctx.dom().query_all(selectors::STAT_NUMBERS);
        if stats.is_empty() {
            return Err(BehaviorError::MissingElement(selectors::STAT_NUMBERS));
        }
        let options = ObserverOptions::default();
        for node in stats {
            ctx.observe(ObserverKind::StatCounter, &options, node);
        }
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut Context<'_>) -> Result<()> {
        match *event {
            PageEvent::Intersection {
                observer: ObserverKind::StatCounter,
                node,
            } => {
                self.start(node, ctx);
                Ok(())
            }
            PageEvent::Deferred {
                task: Deferred::CountFrame(node),
                timestamp,
            } => self.step(node, timestamp, ctx),
            _ => Ok(()),
        }
    }
}
