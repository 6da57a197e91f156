//! # RigidMM Core Library
//!
//! A molecular-mechanics force-field subsystem for rigid-body multibody
//! dynamics engines. Given a partitioning of a molecular system onto rigid
//! bodies, the library builds a validated topological model (atoms, bonds,
//! atom classes, charged atom types, hierarchical rigid clusters) and then,
//! for every configuration supplied by the host engine, computes the total
//! molecular-mechanics potential energy and the resulting spatial force on
//! each body from bond stretches, bends, torsions, Lennard-Jones 12-6 van
//! der Waals interactions and Coulomb interactions between atoms on
//! distinct bodies.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a strict dependency direction,
//! keeping the data model testable in isolation from the evaluation logic.
//!
//! - **[`core`]: The Foundation.** Stateless value types and the molecular
//!   data model: the unit system, the static element table, force-field
//!   parameter types with their canonical-key catalog, the vdW mixing
//!   rules, the pure bend/torsion geometry kernels, and the
//!   atom/bond/cluster/body model (`MolecularModel`).
//!
//! - **[`engine`]: The Subsystem.** The stateful, host-facing layer:
//!   [`engine::subsystem::ForceFieldSubsystem`] owns the model and the
//!   catalog, exposes the definition API, performs the one-shot topology
//!   realization that freezes all derived caches, and runs the force
//!   evaluation kernel against externally supplied body poses and
//!   accumulators.

pub mod core;
pub mod engine;
