use crate::backend::FieldKind;
use crate::scene_params::{FieldParams, SceneParams};
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn index(self) -> usize {
        self as usize
    }
}

// A tweakable value inside a field's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knob {
    Count,
    PointSize,
    Radius,
    Height,
    SpeedFactor,
    OriginY,
    // Flame inner color or smoke tint.
    PrimaryColor(Channel),
    // Flame outer color.
    SecondaryColor(Channel),
    Wind(Axis),
    WaveAmplitude,
    WavePeriod,
}

// A slider bound to one knob of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub label: &'static str,
    pub target: FieldKind,
    pub knob: Knob,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

fn read_shape(field: &FieldParams, knob: Knob) -> Option<f32> {
    match knob {
        Knob::Count => Some(field.count as f32),
        Knob::PointSize => Some(field.point_size),
        Knob::Radius => Some(field.radius),
        Knob::Height => Some(field.height),
        Knob::SpeedFactor => Some(field.speed_factor),
        Knob::OriginY => Some(field.origin[1]),
        _ => None,
    }
}

fn write_shape(field: &mut FieldParams, knob: Knob, value: f32) {
    match knob {
        Knob::Count => field.count = value.round().max(0.0) as u32,
        Knob::PointSize => field.point_size = value,
        Knob::Radius => field.radius = value,
        Knob::Height => field.height = value,
        Knob::SpeedFactor => field.speed_factor = value,
        Knob::OriginY => field.origin[1] = value,
        _ => (),
    }
}

impl Binding {
    pub fn get(&self, params: &SceneParams) -> f32 {
        match self.target {
            FieldKind::Flame => {
                let flame = &params.flame;
                match self.knob {
                    Knob::PrimaryColor(c) => flame.inner_color[c.index()],
                    Knob::SecondaryColor(c) => flame.outer_color[c.index()],
                    knob => read_shape(&flame.field, knob).unwrap_or(0.0),
                }
            }
            FieldKind::Smoke => {
                let smoke = &params.smoke;
                match self.knob {
                    Knob::PrimaryColor(c) | Knob::SecondaryColor(c) => smoke.color[c.index()],
                    Knob::Wind(axis) => smoke.wind[axis.index()],
                    Knob::WaveAmplitude => smoke.wave_amplitude,
                    Knob::WavePeriod => smoke.wave_period,
                    knob => read_shape(&smoke.field, knob).unwrap_or(0.0),
                }
            }
        }
    }

    pub fn set(&self, params: &mut SceneParams, value: f32) {
        let value = value.max(self.min).min(self.max);
        match self.target {
            FieldKind::Flame => {
                let flame = &mut params.flame;
                match self.knob {
                    Knob::PrimaryColor(c) => flame.inner_color[c.index()] = value,
                    Knob::SecondaryColor(c) => flame.outer_color[c.index()] = value,
                    knob => write_shape(&mut flame.field, knob, value),
                }
            }
            FieldKind::Smoke => {
                let smoke = &mut params.smoke;
                match self.knob {
                    Knob::PrimaryColor(c) | Knob::SecondaryColor(c) => {
                        smoke.color[c.index()] = value
                    }
                    Knob::Wind(axis) => smoke.wind[axis.index()] = value,
                    Knob::WaveAmplitude => smoke.wave_amplitude = value,
                    Knob::WavePeriod => smoke.wave_period = value,
                    knob => write_shape(&mut smoke.field, knob, value),
                }
            }
        }
    }

    // Moves the value by whole steps, clamped to [min, max]. Returns whether it changed.
    pub fn nudge(&self, params: &mut SceneParams, steps: i32) -> bool {
        let before = self.get(params);
        self.set(params, before + self.step * steps as f32);
        (self.get(params) - before).abs() > f32::EPSILON
    }
}

fn slider(
    label: &'static str,
    target: FieldKind,
    knob: Knob,
    min: f32,
    max: f32,
    step: f32,
) -> Binding {
    Binding {
        label,
        target,
        knob,
        min,
        max,
        step,
    }
}

fn shape_bindings(target: FieldKind) -> Vec<Binding> {
    vec![
        slider("count", target, Knob::Count, 1.0, 5000.0, 10.0),
        slider("point size", target, Knob::PointSize, 1.0, 500.0, 5.0),
        slider("radius", target, Knob::Radius, 0.0, 3.0, 0.05),
        slider("height", target, Knob::Height, 0.0, 5.0, 0.05),
        slider("speed factor", target, Knob::SpeedFactor, 0.0, 5.0, 0.05),
        slider("origin y", target, Knob::OriginY, -3.0, 3.0, 0.05),
    ]
}

fn color_bindings(
    labels: [&'static str; 3],
    target: FieldKind,
    knob: fn(Channel) -> Knob,
) -> Vec<Binding> {
    labels
        .iter()
        .zip(Channel::ALL.iter())
        .map(|(label, c)| slider(*label, target, knob(*c), 0.0, 1.0, 0.05))
        .collect()
}

// Keyboard-driven parameter panel. Edits a working copy of the scene
// parameters; a commit hands back every field that needs regenerating.
pub struct DebugPanel {
    bindings: Vec<Binding>,
    selected: usize,
    working: SceneParams,
    pending: Vec<FieldKind>,
    pub visible: bool,
}

impl DebugPanel {
    pub fn new(params: &SceneParams) -> Self {
        let mut bindings = Vec::new();
        if params.demo.has_flame() {
            bindings.extend(shape_bindings(FieldKind::Flame));
            bindings.extend(color_bindings(
                ["inner r", "inner g", "inner b"],
                FieldKind::Flame,
                Knob::PrimaryColor,
            ));
            bindings.extend(color_bindings(
                ["outer r", "outer g", "outer b"],
                FieldKind::Flame,
                Knob::SecondaryColor,
            ));
        }
        if params.demo.has_smoke() {
            bindings.extend(shape_bindings(FieldKind::Smoke));
            bindings.extend(color_bindings(
                ["color r", "color g", "color b"],
                FieldKind::Smoke,
                Knob::PrimaryColor,
            ));
            bindings.extend(["wind x", "wind y", "wind z"].iter().zip(Axis::ALL.iter()).map(
                |(label, axis)| slider(*label, FieldKind::Smoke, Knob::Wind(*axis), -2.0, 2.0, 0.05),
            ));
            bindings.push(slider(
                "wave amplitude",
                FieldKind::Smoke,
                Knob::WaveAmplitude,
                0.0,
                1.0,
                0.01,
            ));
            bindings.push(slider(
                "wave period",
                FieldKind::Smoke,
                Knob::WavePeriod,
                0.1,
                10.0,
                0.1,
            ));
        }
        DebugPanel {
            bindings,
            selected: 0,
            working: *params,
            pending: Vec::new(),
            visible: true,
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn params(&self) -> &SceneParams {
        &self.working
    }

    pub fn selected(&self) -> Option<&Binding> {
        self.bindings.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.bindings.is_empty() {
            self.selected = (self.selected + 1) % self.bindings.len();
            self.report();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.bindings.is_empty() {
            self.selected = (self.selected + self.bindings.len() - 1) % self.bindings.len();
            self.report();
        }
    }

    pub fn adjust(&mut self, steps: i32) -> bool {
        let binding = match self.bindings.get(self.selected) {
            Some(binding) => *binding,
            None => return false,
        };
        let changed = binding.nudge(&mut self.working, steps);
        if changed {
            if !self.pending.contains(&binding.target) {
                self.pending.push(binding.target);
            }
            self.report();
        }
        changed
    }

    // Finishes the current edit. Returns the fields edited since the last
    // commit, in the order they were first touched.
    pub fn commit(&mut self) -> Vec<FieldKind> {
        std::mem::take(&mut self.pending)
    }

    // Resets the working copy, e.g. after the scene rejected a commit.
    pub fn sync(&mut self, params: &SceneParams) {
        self.working = *params;
        self.pending.clear();
    }

    pub fn describe(&self) -> String {
        match self.selected() {
            Some(binding) => format!(
                "{:?} {}: {:.2} [{}, {}]",
                binding.target,
                binding.label,
                binding.get(&self.working),
                binding.min,
                binding.max
            ),
            None => String::from("no controls"),
        }
    }

    fn report(&self) {
        if self.visible {
            info!("{}", self.describe());
        }
    }
}
