pub mod pitch;
pub mod chord;
pub mod pitch_class_set;
pub mod scales;
pub mod roman;
pub mod voice_leader;
pub mod morph;
pub mod palette;
pub mod state;
pub mod midi_export;

pub use pitch::*;
pub use chord::*;
pub use pitch_class_set::*;
pub use scales::*;
pub use roman::*;
pub use voice_leader::*;
pub use morph::*;
pub use palette::*;
