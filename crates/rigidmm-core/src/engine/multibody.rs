//! The narrow interface onto the host multibody engine.
//!
//! The force field reads body poses through [`MultibodyState`] and adds
//! its results into caller-owned accumulators: a scalar potential energy
//! and one [`SpatialForce`] per body. Nothing here is ever overwritten,
//! only added to, so several force subsystems can share accumulators.

use crate::core::models::ids::BodyId;
use nalgebra::{Isometry3, Matrix3, Point3, Vector3};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Read access to the host engine's body configurations for one
/// evaluation.
pub trait MultibodyState {
    /// The rigid-body pose of `body` in the ground frame.
    fn body_pose(&self, body: BodyId) -> Isometry3<f64>;
}

/// A spatial force on a rigid body: the torque taken about the ground
/// origin and the force applied at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialForce {
    pub torque: Vector3<f64>,
    pub force: Vector3<f64>,
}

impl SpatialForce {
    pub fn new(torque: Vector3<f64>, force: Vector3<f64>) -> Self {
        Self { torque, force }
    }

    pub fn zero() -> Self {
        Self {
            torque: Vector3::zeros(),
            force: Vector3::zeros(),
        }
    }
}

impl Default for SpatialForce {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for SpatialForce {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            torque: self.torque + rhs.torque,
            force: self.force + rhs.force,
        }
    }
}

impl AddAssign for SpatialForce {
    fn add_assign(&mut self, rhs: Self) {
        self.torque += rhs.torque;
        self.force += rhs.force;
    }
}

impl Sub for SpatialForce {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            torque: self.torque - rhs.torque,
            force: self.force - rhs.force,
        }
    }
}

impl SubAssign for SpatialForce {
    fn sub_assign(&mut self, rhs: Self) {
        self.torque -= rhs.torque;
        self.force -= rhs.force;
    }
}

impl Neg for SpatialForce {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            torque: -self.torque,
            force: -self.force,
        }
    }
}

/// Composite mass properties of a cluster, expressed in a caller-chosen
/// frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f64,
    pub center_of_mass: Point3<f64>,
    pub inertia: Matrix3<f64>,
}
