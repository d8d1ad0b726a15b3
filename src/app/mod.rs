//! Application module: the eframe app and its entry point.
//!
//! | Sub-module          | Responsibility |
//! | ------------------- | -------------- |
//! | [`streamplot_app`]  | [`StreamPlotApp`]: per-frame event handling, render tick and layout |
//! | [`run`]             | [`run_app()`] entry point and icon loading |

mod run;
mod streamplot_app;

pub use run::run_app;
pub use streamplot_app::StreamPlotApp;
