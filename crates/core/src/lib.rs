//! Core emulator primitives and traits.

pub mod cpu_6502;
pub mod logging;

pub mod types {
    use serde::{Deserialize, Serialize};

    /// A finished picture, one palette index per pixel in row-major order.
    ///
    /// Converting indices to colours is left to whoever consumes the frame.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u8>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }

        /// Palette index at `(x, y)`, or `None` outside the frame.
        pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
            if x >= self.width || y >= self.height {
                return None;
            }
            self.pixels.get((y * self.width + x) as usize).copied()
        }
    }
}

/// Description of a mount point (media slot) that a system supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPointInfo {
    /// Unique identifier for this mount point (e.g., "Cartridge")
    pub id: String,
    /// User-friendly name for display (e.g., "Cartridge Slot")
    pub name: String,
    /// File extensions accepted by this mount point (e.g., ["nes"])
    pub extensions: Vec<String>,
    /// Whether this mount point is required for the system to function
    pub required: bool,
}

/// A high-level System trait tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Emulate until a frame is produced and return it.
    fn step_frame(&mut self) -> Result<types::Frame, Self::Error>;

    /// Get the list of mount points this system supports
    fn mount_points(&self) -> Vec<MountPointInfo>;

    /// Load media into a specific mount point
    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Unload media from a specific mount point
    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error>;

    /// Check if a mount point has media loaded
    fn is_mounted(&self, mount_point_id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_initialization() {
        let f = types::Frame::new(10, 10);
        assert_eq!(f.pixels.len(), 100);
        assert_eq!(f.width, 10);
        assert_eq!(f.height, 10);
    }

    #[test]
    fn frame_pixel_lookup_is_row_major() {
        let mut f = types::Frame::new(4, 2);
        f.pixels[4 + 3] = 0x2A;
        assert_eq!(f.pixel(3, 1), Some(0x2A));
        assert_eq!(f.pixel(0, 0), Some(0));
        assert_eq!(f.pixel(4, 0), None);
        assert_eq!(f.pixel(0, 2), None);
    }

    #[test]
    fn frame_serializes_as_plain_json() {
        let mut f = types::Frame::new(2, 1);
        f.pixels[1] = 0x0F;
        let s = serde_json::to_string(&f).expect("serialize");
        let back: types::Frame = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(back, f);
    }

    /// One-slot console that refuses to run with the slot empty.
    #[derive(Default)]
    struct SlotConsole {
        media: Option<Vec<u8>>,
    }

    #[derive(Debug, thiserror::Error, PartialEq, Eq)]
    enum SlotError {
        #[error("nothing in the slot")]
        Empty,
        #[error("no slot named {0}")]
        UnknownSlot(String),
    }

    impl System for SlotConsole {
        type Error = SlotError;

        fn reset(&mut self) -> Result<(), Self::Error> {
            self.media.as_ref().map(|_| ()).ok_or(SlotError::Empty)
        }

        fn step_frame(&mut self) -> Result<types::Frame, Self::Error> {
            self.reset()?;
            Ok(types::Frame::new(4, 3))
        }

        fn mount_points(&self) -> Vec<MountPointInfo> {
            vec![MountPointInfo {
                id: "Cartridge".to_string(),
                name: "Cartridge Slot".to_string(),
                extensions: vec!["nes".to_string()],
                required: true,
            }]
        }

        fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
            if mount_point_id != "Cartridge" {
                return Err(SlotError::UnknownSlot(mount_point_id.to_string()));
            }
            self.media = Some(data.to_vec());
            Ok(())
        }

        fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
            if mount_point_id != "Cartridge" {
                return Err(SlotError::UnknownSlot(mount_point_id.to_string()));
            }
            self.media = None;
            Ok(())
        }

        fn is_mounted(&self, mount_point_id: &str) -> bool {
            mount_point_id == "Cartridge" && self.media.is_some()
        }
    }

    #[test]
    fn required_slot_gates_stepping() {
        let mut console = SlotConsole::default();
        let slots = console.mount_points();
        assert_eq!(slots.len(), 1);
        assert!(slots[0].required);
        assert_eq!(console.step_frame(), Err(SlotError::Empty));

        console.mount(&slots[0].id, &[0x4E, 0x45, 0x53, 0x1A]).unwrap();
        let frame = console.step_frame().unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let mut console = SlotConsole::default();
        assert_eq!(
            console.mount("Tape", &[1]),
            Err(SlotError::UnknownSlot("Tape".to_string()))
        );
        assert!(!console.is_mounted("Tape"));
        console.mount("Cartridge", &[1]).unwrap();
        assert!(console.is_mounted("Cartridge"));
        console.unmount("Cartridge").unwrap();
        assert!(!console.is_mounted("Cartridge"));
        assert_eq!(console.reset(), Err(SlotError::Empty));
    }
}
