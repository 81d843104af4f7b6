use serde::Serialize;

use crate::codec::{wrap_angle, MotionSample};
use crate::constants::{
    DRIFT_SLIP_DECAY, DRIFT_SLIP_GAIN, DRIFT_YAW_MULTIPLIER, GRIP_SLIP_DECAY,
    VEHICLE_ACCELERATION, VEHICLE_BRAKE_DECELERATION, VEHICLE_HANDBRAKE_DECELERATION,
    VEHICLE_MAX_FORWARD_SPEED, VEHICLE_MAX_REVERSE_SPEED, VEHICLE_MAX_YAW_RATE,
    VEHICLE_REVERSE_ACCELERATION, VEHICLE_ROLLING_FRICTION, VEHICLE_TURN_RADIUS,
};
use crate::input::ControlState;

/// Kinematic arcade car on the ground plane.
///
/// Heading 0 faces +z and grows to the left; forward is `(sin h, cos h)` and
/// right is `(cos h, -sin h)`. `speed` runs along the forward axis, `slip`
/// along the right axis and only builds up while the handbrake is held.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vehicle {
    pub x: f64,
    pub z: f64,
    pub heading: f64,
    pub speed: f64,
    pub slip: f64,
}

#[inline]
fn approach(value: f64, target: f64, max_step: f64) -> f64 {
    if value > target {
        (value - max_step).max(target)
    } else {
        (value + max_step).min(target)
    }
}

impl Vehicle {
    pub fn at_rest(x: f64, z: f64, heading: f64) -> Self {
        Self {
            x,
            z,
            heading,
            speed: 0.0,
            slip: 0.0,
        }
    }

    pub fn forward(&self) -> (f64, f64) {
        let (sin, cos) = self.heading.sin_cos();
        (sin, cos)
    }

    pub fn right(&self) -> (f64, f64) {
        let (sin, cos) = self.heading.sin_cos();
        (cos, -sin)
    }

    /// World-space velocity including drift slip.
    pub fn velocity(&self) -> (f64, f64) {
        let (fx, fz) = self.forward();
        let (rx, rz) = self.right();
        (
            self.speed * fx + self.slip * rx,
            self.speed * fz + self.slip * rz,
        )
    }

    pub fn distance_to(&self, x: f64, z: f64) -> f64 {
        (self.x - x).hypot(self.z - z)
    }

    pub fn step(&mut self, dt: f64, controls: &ControlState) {
        self.speed = self.next_speed(dt, controls);

        let mut yaw_rate = (controls.steer() * self.speed / VEHICLE_TURN_RADIUS)
            .clamp(-VEHICLE_MAX_YAW_RATE, VEHICLE_MAX_YAW_RATE);
        if controls.handbrake {
            yaw_rate *= DRIFT_YAW_MULTIPLIER;
        }
        self.heading = wrap_angle(self.heading + yaw_rate * dt);

        let decay = if controls.handbrake {
            // Rotating left throws the body out to the right.
            self.slip -= yaw_rate * self.speed * DRIFT_SLIP_GAIN * dt;
            DRIFT_SLIP_DECAY
        } else {
            GRIP_SLIP_DECAY
        };
        self.slip *= (1.0 - decay * dt).max(0.0);

        let (vx, vz) = self.velocity();
        self.x += vx * dt;
        self.z += vz * dt;
    }

    fn next_speed(&self, dt: f64, controls: &ControlState) -> f64 {
        let throttle = controls.throttle();
        let mut speed = self.speed;

        if throttle > 0.0 {
            speed += if speed < 0.0 {
                VEHICLE_BRAKE_DECELERATION
            } else {
                VEHICLE_ACCELERATION
            } * dt;
        } else if throttle < 0.0 {
            speed -= if speed > 0.0 {
                VEHICLE_BRAKE_DECELERATION
            } else {
                VEHICLE_REVERSE_ACCELERATION
            } * dt;
        } else {
            speed = approach(speed, 0.0, VEHICLE_ROLLING_FRICTION * dt);
        }

        if controls.handbrake {
            speed = approach(speed, 0.0, VEHICLE_HANDBRAKE_DECELERATION * dt);
        }

        speed.clamp(-VEHICLE_MAX_REVERSE_SPEED, VEHICLE_MAX_FORWARD_SPEED)
    }

    pub fn to_sample(&self, time: u32) -> MotionSample {
        let (vx, vz) = self.velocity();
        MotionSample {
            time,
            x: self.x,
            z: self.z,
            heading_y: self.heading,
            vx,
            vz,
        }
    }
}
