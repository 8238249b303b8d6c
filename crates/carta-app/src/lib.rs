// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod assemble;
pub mod ids;
pub mod infer;
pub mod model;
pub mod state;

pub use assemble::*;
pub use ids::*;
pub use infer::*;
pub use model::*;
pub use state::*;
