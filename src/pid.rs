use pid::Pid;

#[derive(Debug, Clone)]
pub struct PidInit {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub output_limit: f64,
}

impl PidInit {
    /// Saturated proportional term, `clamp(-kp * measurement, ±limit)` for a
    /// zero setpoint.
    pub fn proportional(kp: f64, output_limit: f64) -> Self {
        Self {
            kp,
            ki: 0.0,
            kd: 0.0,
            output_limit,
        }
    }

    pub fn build(&self) -> Pid<f64> {
        let Self {
            kp,
            ki,
            kd,
            output_limit,
        } = *self;
        Pid::new(
            kp,
            ki,
            kd,
            output_limit,
            output_limit,
            output_limit,
            output_limit,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_term_opposes_error_and_saturates() {
        let mut pid = PidInit::proportional(2.0, 3.0).build();
        assert_eq!(pid.next_control_output(0.5).output, -1.0);
        assert_eq!(pid.next_control_output(10.0).output, -3.0);
        assert_eq!(pid.next_control_output(-10.0).output, 3.0);
    }
}
