//! Nightwatch — prayer dashboard core.
//!
//! Two independent pieces do the real work:
//! - [`gazetteer`]: the world-cities CSV parsed into a per-country city index.
//! - [`night`]: the thirds of the night between Maghrib and the next Fajr.
//!
//! Around them sit the timings client ([`prayer`]), persisted [`settings`] and
//! the JSON [`server`].

pub mod gazetteer;
pub mod night;
pub mod prayer;
pub mod server;
pub mod settings;
