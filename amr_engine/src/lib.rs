/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

#![allow(dead_code)]
#![deny(warnings)]

//! # amr_engine
//! A distributed merge-tree / connected-component engine over a scalar field
//! defined on an Adaptive Mesh Refinement (AMR) grid.
//!
//! Given a scalar field `f` on a union of rectangular boxes at multiple
//! refinement levels, and a threshold ρ, this crate computes a global
//! topological description of the super-level (or sub-level, via `negate`)
//! set `{x : f(x) ⋈ ρ}`: for each maximal connected component, its deepest
//! vertex, and the pairings of local maxima with the saddles at which their
//! components merge.
//!
//! The crate is organized bottom-up, leaves first:
//! - [`disjoint_sets`] — union-find over [`amr_core::AmrVertexId`].
//! - [`merge_tree`] — the in-memory critical-point tree: build, sparsify,
//!   degree-2 contraction, merge, persistence traversal.
//! - [`masked_box`] — a block's rectangular region with a per-cell mask and
//!   the enumeration of its initial cross-block edges.
//! - [`component`] — a tentative connected component inside one block.
//! - [`block`] — the per-partition container and round-by-round state
//!   machine that drives the protocol to quiescence.
//! - [`config`] — the run's options (threshold, `negate`, sparsification
//!   predicate).
//! - [`serialization`] — the bit-for-bit block wire format.

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub mod errors;
pub use errors::{AmrError, AmrResult};

pub mod disjoint_sets;
pub use disjoint_sets::DisjointSets;

pub mod merge_tree;
pub use merge_tree::{MergeTree, Node, NodeRef};

pub mod masked_box;
pub use masked_box::{Cell, MaskedBox};

pub mod component;
pub use component::Component;

pub mod block;
pub use block::Block;

pub mod config;
pub use config::{Config, ThresholdMode};

pub mod serialization;

pub use amr_core::{AmrEdge, AmrVertexId, DeepOrder, Value, ValueVertex};
