//! Paths and their flattening into polylines.

use std::f32::consts::TAU;

/// Path command.
#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Arc {
        x: f32,
        y: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        counterclockwise: bool,
    },
    Rect(f32, f32, f32, f32),
    ClosePath,
}

/// A 2D path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path2D {
    commands: Vec<PathCommand>,
}

impl Path2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::MoveTo(x, y));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::LineTo(x, y));
    }

    pub fn arc(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        counterclockwise: bool,
    ) {
        self.commands.push(PathCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            counterclockwise,
        });
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(PathCommand::Rect(x, y, width, height));
    }

    pub fn close_path(&mut self) {
        self.commands.push(PathCommand::ClosePath);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Flatten into polylines, one per subpath. Arcs are sampled with
    /// 32 segments per full turn.
    pub fn to_segments(&self) -> Vec<Vec<(f32, f32)>> {
        let mut segments = Vec::new();
        let mut current: Vec<(f32, f32)> = Vec::new();

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(x, y) => {
                    if current.len() > 1 {
                        segments.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push((x, y));
                }
                PathCommand::LineTo(x, y) => current.push((x, y)),
                PathCommand::Arc {
                    x,
                    y,
                    radius,
                    start_angle,
                    end_angle,
                    counterclockwise,
                } => {
                    current.extend(arc_points(
                        x,
                        y,
                        radius,
                        start_angle,
                        end_angle,
                        counterclockwise,
                    ));
                }
                PathCommand::Rect(x, y, w, h) => {
                    if current.len() > 1 {
                        segments.push(std::mem::take(&mut current));
                    }
                    segments.push(vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h), (x, y)]);
                    current = vec![(x, y)];
                }
                PathCommand::ClosePath => {
                    if let Some(&start) = current.first() {
                        current.push(start);
                        segments.push(std::mem::take(&mut current));
                        current.push(start);
                    }
                }
            }
        }

        if current.len() > 1 {
            segments.push(current);
        }
        segments
    }
}

fn arc_points(
    cx: f32,
    cy: f32,
    radius: f32,
    start: f32,
    end: f32,
    counterclockwise: bool,
) -> Vec<(f32, f32)> {
    let mut sweep = end - start;
    if counterclockwise {
        if sweep > 0.0 {
            sweep = sweep % TAU - TAU;
        }
        sweep = sweep.max(-TAU);
    } else {
        if sweep < 0.0 {
            sweep = sweep % TAU + TAU;
        }
        sweep = sweep.min(TAU);
    }

    let steps = ((sweep.abs() / TAU) * 32.0).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let angle = start + sweep * i as f32 / steps as f32;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}
