//! # Frame relay pipeline
//!
//! One producer in, one viewer out, with a false-color transform in
//! the middle:
//!
//! ```text
//!  producer endpoint                                viewer endpoint
//! ┌───────────────────┐                           ┌───────────────────┐
//! │ Envelope(Frame)   │                           │ Envelope(Frame)   │
//! │  raw / zstd bytes │                           │  JPEG bytes       │
//! └─────────┬─────────┘                           └─────────▲─────────┘
//!           │ decode            RelayState                  │ encode
//!           ▼              ┌─────────────────┐              │
//!     FrameDecoder ───────►│ cache + colormap│───► colorize ┘
//!                          └─────────▲───────┘
//!                                    │ switch + recolor
//!                          Envelope(Control JSON)
//!                             from the viewer
//! ```
//!
//! | module    | purpose                                             |
//! |-----------|-----------------------------------------------------|
//! | `state`   | colormap + cached frame behind one lock             |
//! | `slot`    | single-occupancy role slots with displace-and-close |
//! | `control` | viewer JSON settings messages                       |
//! | `server`  | accept loops and per-connection session tasks       |

mod control;
mod server;
mod slot;
mod state;

pub use control::ViewerSettings;
pub use server::{RelayServer, RelayServerConfig};
pub use slot::{RoleSlot, SlotPush};
pub use state::RelayState;
