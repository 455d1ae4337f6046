use crate::error::{BridgeError, Result};

/// One absolute path command of a vector path's `data` string
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadTo { cx: f64, cy: f64, x: f64, y: f64 },
    CubicTo { cx1: f64, cy1: f64, cx2: f64, cy2: f64, x: f64, y: f64 },
    Close,
}

impl PathCommand {
    fn end_point(&self) -> Option<(f64, f64)> {
        match *self {
            PathCommand::MoveTo { x, y }
            | PathCommand::LineTo { x, y }
            | PathCommand::QuadTo { x, y, .. }
            | PathCommand::CubicTo { x, y, .. } => Some((x, y)),
            PathCommand::Close => None,
        }
    }
}

/// Parse path data in the canvas dialect
///
/// The dialect is the absolute subset of SVG path syntax the host accepts:
/// `M x y`, `L x y`, `Q cx cy x y`, `C cx1 cy1 cx2 cy2 x y` and `Z`.
/// Separators may be whitespace or commas, and a command letter may be glued
/// to its first number (`M0 0L10 10Z`).
///
/// # Arguments
/// * `data` - The `data` string of a vector path
///
/// # Returns
/// * `Ok(Vec<PathCommand>)` - The parsed commands
/// * `Err(BridgeError::InvalidProperty)` - On unknown commands, missing or malformed coordinates,
///   or data that does not start with a move
pub fn parse_path_data(data: &str) -> Result<Vec<PathCommand>> {
    let tokens = tokenize(data);
    let mut commands = Vec::new();
    let mut offset = 0;

    while offset < tokens.len() {
        let command = tokens[offset];
        offset += 1;

        let arity = match command {
            "Z" | "z" => 0,
            "M" | "L" => 2,
            "Q" => 4,
            "C" => 6,
            other => {
                return Err(BridgeError::invalid(
                    "vectorPaths",
                    format!("unsupported path command {:?}", other),
                ))
            }
        };

        if offset + arity > tokens.len() {
            return Err(BridgeError::invalid(
                "vectorPaths",
                format!("command {} expects {} coordinates", command, arity),
            ));
        }

        let mut values = [0.0f64; 6];
        for (slot, token) in values.iter_mut().zip(&tokens[offset..offset + arity]) {
            *slot = token.parse::<f64>().map_err(|_| {
                BridgeError::invalid("vectorPaths", format!("{:?} is not a number", token))
            })?;
        }
        offset += arity;

        let parsed = match command {
            "M" => PathCommand::MoveTo { x: values[0], y: values[1] },
            "L" => PathCommand::LineTo { x: values[0], y: values[1] },
            "Q" => PathCommand::QuadTo {
                cx: values[0],
                cy: values[1],
                x: values[2],
                y: values[3],
            },
            "C" => PathCommand::CubicTo {
                cx1: values[0],
                cy1: values[1],
                cx2: values[2],
                cy2: values[3],
                x: values[4],
                y: values[5],
            },
            _ => PathCommand::Close,
        };

        if commands.is_empty() && !matches!(parsed, PathCommand::MoveTo { .. }) {
            return Err(BridgeError::invalid("vectorPaths", "path data must start with M"));
        }
        commands.push(parsed);
    }

    Ok(commands)
}

/// Bounding box `(min_x, min_y, max_x, max_y)` of the path's on-curve points
pub fn path_bounds(commands: &[PathCommand]) -> Option<(f64, f64, f64, f64)> {
    commands
        .iter()
        .filter_map(PathCommand::end_point)
        .fold(None, |bounds, (x, y)| match bounds {
            None => Some((x, y, x, y)),
            Some((min_x, min_y, max_x, max_y)) => {
                Some((min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)))
            }
        })
}

/// Split on separators and before each command letter
fn tokenize(data: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (index, c) in data.char_indices() {
        let is_separator = c.is_whitespace() || c == ',';
        let is_command = c.is_ascii_alphabetic() && c != 'e' && c != 'E';

        if is_separator || is_command {
            if let Some(s) = start.take() {
                tokens.push(&data[s..index]);
            }
            if is_command {
                tokens.push(&data[index..index + c.len_utf8()]);
            }
        } else if start.is_none() {
            start = Some(index);
        }
    }

    if let Some(s) = start {
        tokens.push(&data[s..]);
    }

    tokens
}
