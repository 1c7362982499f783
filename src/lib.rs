//! Diagram canvas engine for character-relationship diagrams.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but every
//! piece of logic except the thin [`engine::Engine`] wrapper is plain Rust and
//! testable natively. It owns the geometry of the diagram: where relationship
//! lines attach to nodes, how textbox content wraps, which element sits under
//! the pointer at a given zoom, and how a drag moves the selection. The host
//! page is responsible for loading the project, wiring DOM events to the
//! engine, and forwarding the resulting [`engine::Action`]s to its panels and
//! persistence layer.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`scene`] | Elements, relationships, and the in-memory [`scene::SceneModel`] |
//! | [`geometry`] | Points, edge attachment, and point-in-shape tests |
//! | [`text`] | Greedy word wrap and textbox line layout |
//! | [`view`] | Bounded zoom and pixel/diagram conversions |
//! | [`hit`] | Topmost-first hit testing for elements and relationship lines |
//! | [`input`] | Selection set, interaction modes, and the drag state machine |
//! | [`render`] | Raster layer: grid, nodes, portraits |
//! | [`overlay`] | Vector layer: relationship lines, labels, arrowheads as SVG |
//! | [`images`] | Portrait load bookkeeping keyed by node id |
//! | [`project`] | Decoding of the saved-project payload for the view page |
//! | [`config`] | Engine thresholds and colors |
//! | [`consts`] | Fixed drawing constants |

pub mod config;
pub mod consts;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod images;
pub mod input;
pub mod overlay;
pub mod project;
pub mod render;
pub mod scene;
pub mod text;
pub mod view;
