#![forbid(unsafe_code)]

//! Device input schema for panes.
//!
//! The web host forwards DOM wheel and keyboard events as JSON using the DOM
//! field names (`deltaY`, `deltaMode`, `metaKey`, ...). This module decodes
//! them into small typed values and resolves the platform paste chord.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held during a keyboard event.
    ///
    /// Encoded as a compact `u8` bitset in logs (`mods`).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

/// Unit of a wheel delta, matching the DOM `deltaMode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    /// Map a raw DOM `deltaMode`. Unknown values fall back to pixels.
    #[must_use]
    pub const fn from_dom(mode: u32) -> Self {
        match mode {
            1 => Self::Line,
            2 => Self::Page,
            _ => Self::Pixel,
        }
    }

    /// Map a `deltaMode` as it arrives in JSON, where hosts may send it as
    /// a float or a negative number. Anything but `1` or `2` is pixels.
    #[must_use]
    pub fn from_dom_number(mode: f64) -> Self {
        if mode.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&mode) {
            Self::from_dom(mode as u32)
        } else {
            Self::Pixel
        }
    }

    #[must_use]
    pub const fn to_dom(self) -> u32 {
        match self {
            Self::Pixel => 0,
            Self::Line => 1,
            Self::Page => 2,
        }
    }
}

/// Vertical wheel input as delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    /// Raw delta in `delta_mode` units. Positive scrolls toward newer output.
    pub delta_y: f64,
    pub delta_mode: DeltaMode,
}

impl WheelInput {
    #[must_use]
    pub const fn pixels(delta_y: f64) -> Self {
        Self {
            delta_y,
            delta_mode: DeltaMode::Pixel,
        }
    }

    #[must_use]
    pub const fn lines(delta_y: f64) -> Self {
        Self {
            delta_y,
            delta_mode: DeltaMode::Line,
        }
    }
}

/// Keyboard input with its DOM `key` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub key: Box<str>,
    pub mods: Modifiers,
}

impl KeyInput {
    #[must_use]
    pub fn new(key: &str, mods: Modifiers) -> Self {
        Self {
            key: key.into(),
            mods,
        }
    }

    fn is_v(&self) -> bool {
        self.key.eq_ignore_ascii_case("v")
    }
}

/// Host platform, as far as shortcut resolution cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    MacOs,
    Other,
}

impl Platform {
    /// Platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Whether `key` is the paste shortcut on `platform`.
///
/// On macOS the chord is `Cmd+V`; `Ctrl+V` is left for the agent process
/// (image paste in some agent CLIs). Elsewhere the chord is `Ctrl+V` and
/// meta is ignored. Shift or alt never form the chord.
#[must_use]
pub fn is_paste_chord(key: &KeyInput, platform: Platform) -> bool {
    if !key.is_v() || key.mods.intersects(Modifiers::SHIFT | Modifiers::ALT) {
        return false;
    }
    match platform {
        Platform::MacOs => {
            key.mods.contains(Modifiers::META) && !key.mods.contains(Modifiers::CTRL)
        }
        Platform::Other => key.mods.contains(Modifiers::CTRL),
    }
}

/// DOM `WheelEvent` fields as forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomWheelEvent {
    #[serde(default)]
    pub delta_y: f64,
    #[serde(default)]
    pub delta_mode: f64,
}

impl From<DomWheelEvent> for WheelInput {
    fn from(ev: DomWheelEvent) -> Self {
        Self {
            delta_y: ev.delta_y,
            delta_mode: DeltaMode::from_dom_number(ev.delta_mode),
        }
    }
}

/// DOM `KeyboardEvent` fields as forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomKeyEvent {
    pub key: String,
    #[serde(default)]
    pub meta_key: bool,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub alt_key: bool,
}

impl From<DomKeyEvent> for KeyInput {
    fn from(ev: DomKeyEvent) -> Self {
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::META, ev.meta_key);
        mods.set(Modifiers::CTRL, ev.ctrl_key);
        mods.set(Modifiers::SHIFT, ev.shift_key);
        mods.set(Modifiers::ALT, ev.alt_key);
        Self {
            key: ev.key.into(),
            mods,
        }
    }
}

impl WheelInput {
    /// Decode a DOM wheel event JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let dom: DomWheelEvent = serde_json::from_str(s)?;
        Ok(dom.into())
    }
}

impl KeyInput {
    /// Decode a DOM keyboard event JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let dom: DomKeyEvent = serde_json::from_str(s)?;
        Ok(dom.into())
    }
}
