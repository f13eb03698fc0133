//! PICO-8 style fantasy console: display and audio core.
//!
//! [`Vm`] is the console context. Drawing, sprite, text, audio and cart-data
//! calls all go through it; the script interpreter and cartridge loader are
//! collaborators that live outside this crate.
//!
//! [`Pico8System`] wraps a `Vm` in the shared [`System`] interface: it turns
//! the packed screen into an ARGB [`Frame`], snapshots state as JSON and
//! accepts the font sheet on the `BIOS` mount point.

pub mod audio;
pub mod cartdata;
pub mod config;
pub mod display;
pub mod draw_state;
pub mod gfx;
pub mod memory;
pub mod sprite;
pub mod text;
pub mod vm;

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::ppu::PackedSurface;
use emu_core::renderer::Renderer;
use emu_core::{types::Frame, MountPointInfo, System};
use serde::de::Error as _;
use serde_json::Value;

pub use audio::{AudioEngine, ChannelStream};
pub use config::{ConfigError, Pico8Config};
pub use display::{DisplayPalette, DisplayRenderer};
pub use draw_state::{ClipRect, ColorArg, ColorBits, DrawState};
pub use text::{BiosFont, FontSource, FONT_BYTES};
pub use vm::Vm;

use audio::sfx::MUSIC_PATTERN_COUNT;
use audio::{AudioState, SFX_COUNT};
use memory::{FLAG_COUNT, MAP_HEIGHT, MAP_WIDTH, SCREEN_SIZE, SHEET_SIZE};

const BIOS_MOUNT: &str = "BIOS";
const STATE_VERSION: u64 = 1;

#[derive(thiserror::Error, Debug)]
pub enum Pico8Error {
    #[error("Invalid mount point")]
    InvalidMountPoint,
    #[error("Invalid BIOS size: expected {expected} bytes, got {actual}")]
    InvalidBiosSize { expected: usize, actual: usize },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub struct Pico8System {
    vm: Vm,
    display: DisplayRenderer,
    config: Pico8Config,
    palette: DisplayPalette,
    bios_loaded: bool,
}

impl Default for Pico8System {
    fn default() -> Self {
        Self::new()
    }
}

impl Pico8System {
    pub fn new() -> Self {
        let config = Pico8Config::default();
        let palette = config.display_palette().unwrap_or_default();
        Self {
            vm: Vm::new(),
            display: DisplayRenderer::new(),
            config,
            palette,
            bios_loaded: false,
        }
    }

    /// Build a system from `config`, applying its logging settings.
    pub fn with_config(config: Pico8Config) -> Result<Self, Pico8Error> {
        let palette = config.display_palette()?;
        config.apply_logging();
        Ok(Self {
            palette,
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &Pico8Config {
        &self.config
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Pull handle for channel `ch`, for the host audio thread.
    pub fn audio_stream(&self, ch: usize) -> ChannelStream {
        self.vm.audio_stream(ch)
    }
}

fn invalid(msg: impl std::fmt::Display) -> serde_json::Error {
    serde_json::Error::custom(msg)
}

fn check_surface(
    name: &str,
    surface: &PackedSurface,
    size: usize,
) -> Result<(), serde_json::Error> {
    if surface.width() != size
        || surface.height() != size
        || surface.bytes().len() != size * size / 2
    {
        return Err(invalid(format!(
            "{} must be a packed {}x{} surface",
            name, size, size
        )));
    }
    Ok(())
}

fn check_len(name: &str, actual: usize, expected: usize) -> Result<(), serde_json::Error> {
    if actual != expected {
        return Err(invalid(format!(
            "{} has {} entries, expected {}",
            name, actual, expected
        )));
    }
    Ok(())
}

impl System for Pico8System {
    type Error = Pico8Error;

    fn reset(&mut self) {
        self.vm.reset();
        self.display.reset();
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        self.display.render(
            self.vm.screen(),
            &self.vm.draw_state().screen_palette,
            &self.palette,
        );
        Ok(self.display.get_frame().clone())
    }

    fn save_state(&self) -> Value {
        let ram = self.vm.ram();
        serde_json::json!({
            "system": "pico8",
            "version": STATE_VERSION,
            "draw_state": ram.draw_state,
            "screen": ram.screen,
            "gfx": ram.gfx,
            "map": ram.map,
            "flags": ram.flags,
            "audio": self.vm.audio().snapshot(),
        })
    }

    fn load_state(&mut self, v: &Value) -> Result<(), serde_json::Error> {
        if let Some(version) = v.get("version").and_then(Value::as_u64) {
            if version != STATE_VERSION {
                return Err(invalid(format!("unsupported state version {}", version)));
            }
        }

        // Validate every section before touching the live state.
        let mut ram = self.vm.ram().clone();
        if let Some(section) = v.get("draw_state") {
            ram.draw_state = serde_json::from_value(section.clone())?;
            let clip = ram.draw_state.clip;
            if clip.x1 > clip.x2
                || clip.y1 > clip.y2
                || clip.x2 as usize > SCREEN_SIZE
                || clip.y2 as usize > SCREEN_SIZE
            {
                return Err(invalid("clip rect outside the screen"));
            }
        }
        if let Some(section) = v.get("screen") {
            ram.screen = serde_json::from_value(section.clone())?;
            check_surface("screen", &ram.screen, SCREEN_SIZE)?;
        }
        if let Some(section) = v.get("gfx") {
            ram.gfx = serde_json::from_value(section.clone())?;
            check_surface("gfx", &ram.gfx, SHEET_SIZE)?;
        }
        if let Some(section) = v.get("map") {
            ram.map = serde_json::from_value(section.clone())?;
            check_len("map", ram.map.len(), MAP_WIDTH * MAP_HEIGHT)?;
        }
        if let Some(section) = v.get("flags") {
            ram.flags = serde_json::from_value(section.clone())?;
            check_len("flags", ram.flags.len(), FLAG_COUNT)?;
        }
        let audio = match v.get("audio") {
            Some(section) => {
                let audio: AudioState = serde_json::from_value(section.clone())?;
                check_len("sfx", audio.sfx.len(), SFX_COUNT)?;
                check_len("patterns", audio.patterns.len(), MUSIC_PATTERN_COUNT)?;
                Some(audio)
            }
            None => None,
        };

        *self.vm.ram_mut() = ram;
        if let Some(audio) = audio {
            self.vm.audio().restore(audio);
        }
        log(LogCategory::System, LogLevel::Info, || "save state loaded".to_string());
        Ok(())
    }

    fn supports_save_states(&self) -> bool {
        true
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        vec![MountPointInfo {
            id: BIOS_MOUNT.to_string(),
            name: "BIOS Font Sheet".to_string(),
            extensions: vec!["bin".to_string(), "rom".to_string()],
            required: false,
        }]
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        if mount_point_id != BIOS_MOUNT {
            return Err(Pico8Error::InvalidMountPoint);
        }

        let font = BiosFont::from_bytes(data).map_err(|_| Pico8Error::InvalidBiosSize {
            expected: FONT_BYTES,
            actual: data.len(),
        })?;
        self.vm.set_font(Box::new(font));
        self.bios_loaded = true;

        log(LogCategory::System, LogLevel::Info, || {
            format!("BIOS font mounted ({} bytes)", data.len())
        });
        Ok(())
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        if mount_point_id != BIOS_MOUNT {
            return Err(Pico8Error::InvalidMountPoint);
        }

        self.vm.set_font(Box::new(BiosFont::blank()));
        self.bios_loaded = false;
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        mount_point_id == BIOS_MOUNT && self.bios_loaded
    }
}
