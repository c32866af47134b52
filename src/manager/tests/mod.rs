//! Tests for the per-view display managers.
//!
//! These drive managers through a real scene, its singletons and views, and
//! check the widgets each manager keeps in its view.

mod support;

mod fiducial_tests;
mod region_tests;
