use crate::{BusTap, Result, SurfaceView, VisualizerSurface, Widget};

/// Oscilloscope-style trace of the most recent output.
#[derive(Debug, Clone)]
pub struct Waveform {
    tap: BusTap,
    points: usize,
}

impl Waveform {
    pub fn new(tap: BusTap, points: usize) -> Self {
        Self {
            tap,
            points: points.max(1),
        }
    }
}

impl VisualizerSurface for Waveform {
    fn render(&self) -> Result<SurfaceView> {
        let points = self.tap.recent(self.points)?;
        let peak = points.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));

        let mut view = SurfaceView::new("Waveform");
        view.push(Widget::Meter {
            label: "peak".to_string(),
            value: peak,
        });
        view.push(Widget::Trace {
            label: "output".to_string(),
            points,
        });
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AudioBus, AudioConfig};

    #[test]
    fn traces_the_latest_samples() {
        let bus = AudioBus::new(&AudioConfig::default());
        let waveform = Waveform::new(bus.tap(), 3);

        let idle = waveform.render().unwrap();
        assert_eq!(idle.meter("peak"), Some(0.0));

        let id = bus.connect().unwrap();
        bus.write(id, &[0.1, -0.9, 0.2, 0.4]).unwrap();

        let view = waveform.render().unwrap();
        assert_eq!(view.meter("peak"), Some(0.9));
        assert_eq!(view.meter("rms"), None);
        assert!(view.widgets.contains(&Widget::Trace {
            label: "output".into(),
            points: vec![-0.9, 0.2, 0.4],
        }));
    }
}
