//! Time-scheduled parameter automation.

/*
Parameter Automation
====================

A gain stage's value is not set sample by sample by the caller. Instead the
caller schedules a timeline of events against the engine clock, and the
renderer evaluates that timeline at every sample time.

Vocabulary
----------

  anchor      The (time, value) point the next event starts from. Initially
              (0.0, default value); each completed event moves it.

  SetValue    Jump to `value` at `time`. Before `time` the previous value holds.

  LinearRamp  Straight line from the anchor to (`end_time`, `value`). The ramp
              begins where the previous event ended, not where it was
              scheduled.

  SetTarget   Exponential approach toward `target`, starting at `start_time`:

                  v(t) = target + (v0 - target) · e^(-(t - start) / τ)

              It runs until the next event begins. After ~5τ it is within 1%.


The Shape of an Envelope
------------------------

  gain
   0.3 ┤      ╱╲
       │     ╱  ╲         attack:  SetValue(0, t0), LinearRamp(0.3, t0 + A)
  0.15 ┤    ╱    ╲╲       release: SetValue(v, now), LinearRamp(0, now + R)
       │   ╱       ╲╲
   0.0 ┼──╱──────────╲╲──→ t
         t0   now    now+R


Cancelling
----------

`cancel_scheduled_values(t)` removes every event whose time is at or after
`t`. A ramp that is mid-flight at `t` ends after `t`, so it is removed whole
and the value falls back to the last explicitly set point. That jump is an
audible click when it lands on a sounding voice.

`cancel_and_hold(t)` avoids the jump: it evaluates the curve at `t` first and
pins it there after cancelling.

Implementation Notes
--------------------

Events are kept sorted by their time (ramps sort by their end). Evaluation is
a linear walk, so `prune` folds finished events into the anchor once per
render block to keep the walk short.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    SetValue {
        value: f32,
        time: f64,
    },
    LinearRamp {
        value: f32,
        end_time: f64,
    },
    SetTarget {
        target: f32,
        start_time: f64,
        time_constant: f64,
    },
}

impl AutomationEvent {
    /// Sort key: when the event is pinned on the timeline.
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } => time,
            AutomationEvent::LinearRamp { end_time, .. } => end_time,
            AutomationEvent::SetTarget { start_time, .. } => start_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamTimeline {
    anchor_value: f32,
    anchor_time: f64,
    events: Vec<AutomationEvent>,
}

impl ParamTimeline {
    pub fn new(value: f32) -> Self {
        Self {
            anchor_value: value,
            anchor_time: 0.0,
            events: Vec::new(),
        }
    }

    /// Insert keeping time order; equal times keep insertion order.
    pub fn schedule(&mut self, event: AutomationEvent) {
        let time = event.time();
        let index = self.events.partition_point(|e| e.time() <= time);
        self.events.insert(index, event);
    }

    /// Drop every event at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Cancel from `time` on, holding the value the curve had at `time`.
    pub fn cancel_and_hold(&mut self, time: f64) {
        let held = self.value_at(time);
        let interrupted_ramp = self
            .events
            .iter()
            .find(|e| e.time() >= time)
            .is_some_and(|e| matches!(e, AutomationEvent::LinearRamp { .. }));

        self.cancel_scheduled_values(time);

        if interrupted_ramp {
            // Keep the part of the ramp that already played.
            self.events.push(AutomationEvent::LinearRamp {
                value: held,
                end_time: time,
            });
        } else {
            self.events.push(AutomationEvent::SetValue { value: held, time });
        }
    }

    /// Start time of the event at `index`, used to end a preceding SetTarget.
    fn start_of(&self, index: usize, previous_start: f64) -> f64 {
        match self.events.get(index) {
            Some(AutomationEvent::SetValue { time, .. }) => *time,
            Some(AutomationEvent::SetTarget { start_time, .. }) => *start_time,
            // A ramp begins where the previous event begins.
            Some(AutomationEvent::LinearRamp { .. }) => previous_start,
            None => f64::INFINITY,
        }
    }

    pub fn value_at(&self, t: f64) -> f32 {
        let mut value = self.anchor_value;
        let mut anchor = self.anchor_time;

        for (index, event) in self.events.iter().enumerate() {
            match *event {
                AutomationEvent::SetValue { value: v, time } => {
                    if t < time {
                        return value;
                    }
                    value = v;
                    anchor = time;
                }
                AutomationEvent::LinearRamp { value: v, end_time } => {
                    if t < end_time {
                        let span = end_time - anchor;
                        if span <= 0.0 {
                            return v;
                        }
                        let progress = ((t - anchor) / span).clamp(0.0, 1.0) as f32;
                        return value + (v - value) * progress;
                    }
                    value = v;
                    anchor = end_time;
                }
                AutomationEvent::SetTarget {
                    target,
                    start_time,
                    time_constant,
                } => {
                    if t < start_time {
                        return value;
                    }
                    let end = self.start_of(index + 1, start_time);
                    let eval = t.min(end);
                    let approached = approach(value, target, eval - start_time, time_constant);
                    if t < end {
                        return approached;
                    }
                    value = approached;
                    anchor = end;
                }
            }
        }

        value
    }

    /// Fold events that are complete at `t` into the anchor.
    pub fn prune(&mut self, t: f64) {
        while let Some(first) = self.events.first().copied() {
            match first {
                AutomationEvent::SetValue { value, time } if time <= t => {
                    self.anchor_value = value;
                    self.anchor_time = time;
                }
                AutomationEvent::LinearRamp { value, end_time } if end_time <= t => {
                    self.anchor_value = value;
                    self.anchor_time = end_time;
                }
                AutomationEvent::SetTarget {
                    target,
                    start_time,
                    time_constant,
                } => {
                    let end = self.start_of(1, start_time);
                    if end > t {
                        break;
                    }
                    self.anchor_value =
                        approach(self.anchor_value, target, end - start_time, time_constant);
                    self.anchor_time = end;
                }
                _ => break,
            }
            self.events.remove(0);
        }
    }

    pub fn pending(&self) -> &[AutomationEvent] {
        &self.events
    }
}

#[inline]
fn approach(from: f32, target: f32, elapsed: f64, time_constant: f64) -> f32 {
    if time_constant <= 0.0 {
        return target;
    }
    let decay = (-(elapsed.max(0.0)) / time_constant).exp() as f32;
    target + (from - target) * decay
}
