/// What a decision source sees each tick: vertical offset of the player from
/// the next gap center, player velocity, and x of the next obstacle. All
/// zeros when no obstacle is ahead.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Observation {
    pub gap_offset: f32,
    pub velocity: f32,
    pub obstacle_x: f32,
}

impl Observation {
    pub fn to_array(self) -> [f32; 3] {
        [self.gap_offset, self.velocity, self.obstacle_x]
    }
}

/// Produces the binary flap/no-flap choice for one tick.
pub trait DecisionSource {
    fn decide(&mut self, obs: Observation) -> bool;
}

/// Human input: a discrete key press arms a one-shot flag, consumed by the
/// next tick.
#[derive(Default)]
pub struct KeyboardSource {
    armed: bool,
}

impl KeyboardSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self) {
        self.armed = true;
    }
}

impl DecisionSource for KeyboardSource {
    fn decide(&mut self, _obs: Observation) -> bool {
        std::mem::take(&mut self.armed)
    }
}
