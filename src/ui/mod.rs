//! Map controls and popups. The data types are backend-neutral; the egui
//! widget that draws them is behind the `egui` feature.

pub mod controls;
pub mod popup;

#[cfg(feature = "egui")]
pub mod widget;

pub use controls::{ControlManager, ControlPosition, LayerControl, LayerEntry, LegendControl};
pub use popup::{strip_markup, Popup, PopupManager};

#[cfg(feature = "egui")]
pub use widget::QuakeMapWidget;
