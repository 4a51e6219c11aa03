use palette::Srgb;

/// Which of the two gradient slots a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Double-buffered gradient colors.
///
/// New colors always land in the hidden slot and then become the visible
/// one, so whatever was on screen stays intact as the outgoing half of the
/// crossfade. The renderer animates opacity between the two slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadeGradient {
    first: Vec<Srgb<u8>>,
    second: Vec<Srgb<u8>>,
    first_visible: bool,
}

impl Default for CrossfadeGradient {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CrossfadeGradient {
    pub fn new(initial: Vec<Srgb<u8>>) -> Self {
        Self {
            first: initial,
            second: Vec::new(),
            first_visible: true,
        }
    }

    /// Colors of the visible slot.
    pub fn colors(&self) -> &[Srgb<u8>] {
        self.slot(self.active_slot())
    }

    pub fn set_colors(&mut self, colors: Vec<Srgb<u8>>) {
        if self.first_visible {
            self.second = colors;
        } else {
            self.first = colors;
        }
        self.first_visible = !self.first_visible;
    }

    pub fn active_slot(&self) -> Slot {
        if self.first_visible {
            Slot::First
        } else {
            Slot::Second
        }
    }

    pub fn slot(&self, slot: Slot) -> &[Srgb<u8>] {
        match slot {
            Slot::First => &self.first,
            Slot::Second => &self.second,
        }
    }

    pub fn first(&self) -> &[Srgb<u8>] {
        &self.first
    }

    pub fn second(&self) -> &[Srgb<u8>] {
        &self.second
    }

    pub fn first_visible(&self) -> bool {
        self.first_visible
    }
}
