//! Visual DMA debugger.
//!
//! After Denise has finished a line, every bus cycle of that line is painted
//! over the four framebuffer pixels it covers, in the colour of the channel
//! that owned the cycle. The transferred word picks one of four shades so
//! that data patterns stay visible.

use commodore_agnus_ocs::{BusChannel, BusOwner, HPOS_CNT};

/// A colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Move `weight` of the way towards `other`.
    #[must_use]
    pub fn mix(self, other: Self, weight: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * weight,
            g: self.g + (other.g - self.g) * weight,
            b: self.b + (other.b - self.b) * weight,
        }
    }

    #[must_use]
    pub fn shade(self, weight: f32) -> Self {
        self.mix(Self::BLACK, weight)
    }

    #[must_use]
    pub fn tint(self, weight: f32) -> Self {
        self.mix(Self::WHITE, weight)
    }

    #[must_use]
    pub fn from_argb(pixel: u32) -> Self {
        let c = |shift: u32| f32::from(((pixel >> shift) & 0xFF) as u8) / 255.0;
        Self::new(c(16), c(8), c(0))
    }

    #[must_use]
    pub fn to_argb(self) -> u32 {
        let c = |v: f32| u32::from((v.clamp(0.0, 1.0) * 255.0).round() as u8);
        0xFF00_0000 | (c(self.r) << 16) | (c(self.g) << 8) | c(self.b)
    }
}

/// How the overlay is blended with the picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DisplayMode {
    /// Channel colours over the picture, more opaque with higher opacity.
    #[default]
    ModulateForeground,
    /// Channel colours at full strength, idle cycles dimmed.
    ModulateBackground,
    /// Both of the above.
    ModulateOddEven,
}

#[derive(Debug, Clone)]
pub struct DmaDebugger {
    pub enabled: bool,
    pub mode: DisplayMode,
    opacity: f32,
    visualize: [bool; BusChannel::COUNT],
    /// Four drawing shades plus the configured colour.
    colors: [[Rgb; 5]; BusChannel::COUNT],
}

impl DmaDebugger {
    #[must_use]
    pub fn new() -> Self {
        let mut debugger = Self {
            enabled: false,
            mode: DisplayMode::default(),
            opacity: 0.5,
            visualize: [true; BusChannel::COUNT],
            colors: [[Rgb::BLACK; 5]; BusChannel::COUNT],
        };
        debugger.visualize[BusChannel::None.index()] = false;
        debugger.visualize[BusChannel::Cpu.index()] = false;

        debugger.set_color(BusChannel::Cpu, Rgb::new(1.0, 1.0, 1.0));
        debugger.set_color(BusChannel::Refresh, Rgb::new(1.0, 0.0, 0.0));
        debugger.set_color(BusChannel::Disk, Rgb::new(0.0, 1.0, 0.0));
        debugger.set_color(BusChannel::Audio, Rgb::new(1.0, 0.0, 1.0));
        debugger.set_color(BusChannel::Bitplane, Rgb::new(0.0, 1.0, 1.0));
        debugger.set_color(BusChannel::Sprite, Rgb::new(0.0, 0.5, 1.0));
        debugger.set_color(BusChannel::Copper, Rgb::new(1.0, 1.0, 0.0));
        debugger.set_color(BusChannel::Blitter, Rgb::new(1.0, 0.8, 0.0));
        debugger
    }

    #[must_use]
    pub fn is_visualized(&self, channel: BusChannel) -> bool {
        self.visualize[channel.index()]
    }

    pub fn set_visualized(&mut self, channel: BusChannel, value: bool) {
        self.visualize[channel.index()] = value;
    }

    #[must_use]
    pub fn color(&self, channel: BusChannel) -> Rgb {
        self.colors[channel.index()][4]
    }

    pub fn set_color(&mut self, channel: BusChannel, color: Rgb) {
        self.colors[channel.index()] = [
            color.shade(0.3),
            color.shade(0.1),
            color.tint(0.1),
            color.tint(0.3),
            color,
        ];
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, value: f32) {
        assert!((0.0..=1.0).contains(&value), "opacity {value} out of range");
        self.opacity = value;
    }

    fn weights(&self) -> (f32, f32) {
        match self.mode {
            DisplayMode::ModulateForeground => (0.0, 1.0 - self.opacity),
            DisplayMode::ModulateBackground => (1.0 - self.opacity, 0.0),
            DisplayMode::ModulateOddEven => (self.opacity, 1.0 - self.opacity),
        }
    }

    /// Paint the bus usage of one line over its framebuffer row.
    pub fn overlay(&self, owners: &[BusOwner], values: &[u16], row: &mut [u32]) {
        if !self.enabled {
            return;
        }
        let (bg_weight, fg_weight) = self.weights();

        for (h, (owner, &value)) in owners.iter().zip(values).enumerate().take(usize::from(HPOS_CNT)) {
            let Some(pixels) = row.get_mut(4 * h..4 * h + 4) else {
                break;
            };
            let channel = owner.channel();

            if !self.is_visualized(channel) {
                if bg_weight > 0.0 {
                    for p in pixels {
                        *p = Rgb::from_argb(*p).shade(bg_weight).to_argb();
                    }
                }
                continue;
            }

            let shades = &self.colors[channel.index()];
            for (i, p) in pixels.iter_mut().enumerate() {
                let shift = 14 - 4 * i;
                let mut color = shades[usize::from((value >> shift) & 0b11)];
                if fg_weight > 0.0 {
                    color = color.mix(Rgb::from_argb(*p), fg_weight);
                }
                *p = color.to_argb();
            }
        }
    }
}

impl Default for DmaDebugger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEN: usize = HPOS_CNT as usize;

    fn line_with(h: usize, owner: BusOwner, value: u16) -> ([BusOwner; LEN], [u16; LEN]) {
        let mut owners = [BusOwner::None; LEN];
        let mut values = [0; LEN];
        owners[h] = owner;
        values[h] = value;
        (owners, values)
    }

    #[test]
    fn cpu_and_idle_cycles_are_hidden_by_default() {
        let debugger = DmaDebugger::new();
        assert!(!debugger.is_visualized(BusChannel::Cpu));
        assert!(!debugger.is_visualized(BusChannel::None));
        assert!(debugger.is_visualized(BusChannel::Copper));
    }

    #[test]
    fn disabled_debugger_leaves_the_row_alone() {
        let debugger = DmaDebugger::new();
        let (owners, values) = line_with(1, BusOwner::Refresh, 0);
        let mut row = vec![0xFF12_3456; LEN * 4];
        debugger.overlay(&owners, &values, &mut row);
        assert!(row.iter().all(|&p| p == 0xFF12_3456));
    }

    #[test]
    fn opaque_overlay_uses_channel_shades() {
        let mut debugger = DmaDebugger::new();
        debugger.enabled = true;
        debugger.set_opacity(1.0);
        let (owners, values) = line_with(1, BusOwner::Refresh, 0xC000);
        let mut row = vec![0xFF00_0000; LEN * 4];
        debugger.overlay(&owners, &values, &mut row);

        let red = Rgb::new(1.0, 0.0, 0.0);
        assert_eq!(row[4], red.tint(0.3).to_argb(), "top bits 11");
        assert_eq!(row[5], red.shade(0.3).to_argb(), "next bits 00");
        assert_eq!(row[0], 0xFF00_0000, "idle cycle untouched");
    }

    #[test]
    fn background_mode_dims_idle_cycles() {
        let mut debugger = DmaDebugger::new();
        debugger.enabled = true;
        debugger.mode = DisplayMode::ModulateBackground;
        debugger.set_opacity(0.5);
        let (owners, values) = line_with(1, BusOwner::Copper, 0);
        let mut row = vec![0xFFFF_FFFF; LEN * 4];
        debugger.overlay(&owners, &values, &mut row);
        assert_eq!(row[0], Rgb::WHITE.shade(0.5).to_argb());
    }

    #[test]
    fn argb_round_trip_keeps_components() {
        let c = Rgb::from_argb(0xFF80_40C0);
        assert_eq!(c.to_argb(), 0xFF80_40C0);
    }
}
