// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! OpenSCAD parser using pest
//!
//! Evaluates assignments and arithmetic while parsing, so the resulting AST
//! only carries literal values. Variables are scoped to their block and are
//! all assigned before the block's module calls run.
//!
//! Modifiers: `*` and `%` drop their subtree, `#` is ignored, and the first
//! `!` subtree replaces the whole program.

use crate::ast::{AstNode, ColorSpec, Size2, Size3};
use ahash::AHashMap;
use nalgebra::{Rotation3, Unit, Vector3};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser)]
#[grammar = "io/scad.pest"]
struct ScadParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("line {line}: unknown variable '{name}'")]
    UnknownVariable { name: String, line: usize },
    #[error("line {line}: {reason}")]
    Expression { line: usize, reason: String },
    #[error("line {line}: {module}() argument '{argument}' {reason}")]
    InvalidArgument {
        module: String,
        argument: String,
        line: usize,
        reason: String,
    },
    #[error("failed to read SCAD file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parse OpenSCAD source into its root statements. A `!` subtree, when
/// present, is returned as the only root.
pub fn parse_scad(source: &str) -> Result<Vec<AstNode>, ParseError> {
    let mut pairs =
        ScadParser::parse(Rule::program, source).map_err(|e| ParseError::Syntax(e.to_string()))?;
    let program = pairs
        .next()
        .ok_or_else(|| ParseError::Syntax("empty program".to_string()))?;

    let statements = program
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::statement)
        .collect();
    let mut root = None;
    let nodes = evaluate_block(statements, &Scope::default(), &mut root)?;
    Ok(match root {
        Some(node) => vec![node],
        None => nodes,
    })
}

/// Read and parse a `.scad` file
pub fn import_scad_file(path: impl AsRef<Path>) -> Result<Vec<AstNode>, ParseError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scad(&source)
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Undef,
    Bool(bool),
    Number(f64),
    Str(String),
    Vector(Vec<Value>),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Undef => "undef",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::Str(_) => "a string",
            Value::Vector(_) => "a vector",
        }
    }
}

type Scope = AHashMap<String, Value>;

/// Subtree marked with `!`, once one has been evaluated
type Root = Option<AstNode>;

fn malformed(what: &str) -> ParseError {
    ParseError::Syntax(format!("malformed {}", what))
}

fn evaluate_block(
    statements: Vec<Pair<'_, Rule>>,
    parent: &Scope,
    root: &mut Root,
) -> Result<Vec<AstNode>, ParseError> {
    let mut scope = parent.clone();
    let mut calls = Vec::new();

    for statement in statements {
        let Some(inner) = statement.into_inner().next() else {
            continue;
        };
        match inner.as_rule() {
            Rule::assignment => {
                let mut parts = inner.into_inner();
                let name = parts.next().ok_or_else(|| malformed("assignment"))?;
                let expr = parts.next().ok_or_else(|| malformed("assignment"))?;
                let value = evaluate(expr, &scope)?;
                scope.insert(name.as_str().to_string(), value);
            }
            Rule::module_call | Rule::block => calls.push(inner),
            _ => {}
        }
    }

    let mut nodes = Vec::new();
    for call in calls {
        if call.as_rule() == Rule::block {
            let statements = call.into_inner().collect();
            nodes.extend(evaluate_block(statements, &scope, root)?);
        } else if let Some(node) = module_call(call, &scope, root)? {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

fn module_call(
    pair: Pair<'_, Rule>,
    scope: &Scope,
    root: &mut Root,
) -> Result<Option<AstNode>, ParseError> {
    let line = pair.line_col().0;
    let mut name = None;
    let mut modifier = None;
    let mut arguments = None;
    let mut child = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::modifier => modifier = Some(part.as_str()),
            Rule::ident => name = Some(part.as_str().to_string()),
            Rule::arguments => arguments = Some(part),
            Rule::child => child = Some(part),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| malformed("module call"))?;
    match modifier {
        Some("*") => {
            log::debug!("line {}: skipping disabled {}()", line, name);
            return Ok(None);
        }
        Some("%") => {
            log::debug!("line {}: skipping background {}()", line, name);
            return Ok(None);
        }
        Some("#") => log::debug!("line {}: rendering highlighted {}() as-is", line, name),
        _ => {}
    }

    // a `!` further out wins over one nested in its children
    let had_root = root.is_some();
    let args = Arguments::parse(&name, line, arguments, scope)?;
    let children = match child {
        Some(child) => child_nodes(child, scope, root)?,
        None => Vec::new(),
    };
    let node = build_node(&name, &args, children, scope)?;

    if modifier == Some("!") {
        if !had_root {
            log::debug!("line {}: {}() replaces the program root", line, name);
            *root = Some(node);
        }
        return Ok(None);
    }
    Ok(Some(node))
}

fn child_nodes(
    child: Pair<'_, Rule>,
    scope: &Scope,
    root: &mut Root,
) -> Result<Vec<AstNode>, ParseError> {
    let Some(inner) = child.into_inner().next() else {
        return Ok(Vec::new());
    };
    match inner.as_rule() {
        Rule::block => evaluate_block(inner.into_inner().collect(), scope, root),
        Rule::module_call => Ok(module_call(inner, scope, root)?.into_iter().collect()),
        _ => Ok(Vec::new()),
    }
}

fn build_node(
    name: &str,
    args: &Arguments,
    children: Vec<AstNode>,
    scope: &Scope,
) -> Result<AstNode, ParseError> {
    let node = match name {
        "cube" => AstNode::Cube {
            size: args.size3("size", Some(0))?.unwrap_or_default(),
            center: args.boolean("center", Some(1))?.unwrap_or(false),
        },
        "sphere" => AstNode::Sphere {
            r: args.radius("r", "d", Some(0))?.unwrap_or(1.0),
            fn_: args.segments(scope)?,
        },
        "cylinder" => AstNode::Cylinder {
            h: args.number("h", Some(0))?.unwrap_or(1.0),
            r: args.radius("r", "d", None)?,
            r1: args.radius("r1", "d1", Some(1))?,
            r2: args.radius("r2", "d2", Some(2))?,
            center: args.boolean("center", Some(3))?.unwrap_or(false),
            fn_: args.segments(scope)?,
        },
        "polyhedron" => AstNode::Polyhedron {
            points: args.required(args.points3("points", Some(0))?, "points")?,
            faces: match args.faces("faces", Some(1))? {
                Some(faces) => faces,
                None => args.required(args.faces("triangles", None)?, "faces")?,
            },
        },
        "circle" => AstNode::Circle {
            r: args.radius("r", "d", Some(0))?.unwrap_or(1.0),
            fn_: args.segments(scope)?,
        },
        "square" => AstNode::Square {
            size: args.size2("size", Some(0))?.unwrap_or_default(),
            center: args.boolean("center", Some(1))?.unwrap_or(false),
        },
        "polygon" => AstNode::Polygon {
            points: args.required(args.points2("points", Some(0))?, "points")?,
        },
        "translate" => AstNode::Translate {
            v: args.vec3("v", Some(0), 0.0)?.unwrap_or([0.0; 3]),
            children,
        },
        "rotate" => rotate(args, children)?,
        "scale" => AstNode::Scale {
            v: match args.get("v", Some(0)) {
                Some(Value::Number(s)) => [*s; 3],
                _ => args.vec3("v", Some(0), 1.0)?.unwrap_or([1.0; 3]),
            },
            children,
        },
        "mirror" => AstNode::Mirror {
            v: args.vec3("v", Some(0), 0.0)?.unwrap_or([1.0, 0.0, 0.0]),
            children,
        },
        "multmatrix" => AstNode::Multmatrix {
            m: args.required(args.matrix("m", Some(0))?, "m")?,
            children,
        },
        "color" => AstNode::Color {
            c: match args.get("c", Some(0)) {
                Some(Value::Str(name)) => ColorSpec::Name(name.clone()),
                _ => ColorSpec::Components(args.required(args.numbers("c", Some(0))?, "c")?),
            },
            alpha: args.number("alpha", Some(1))?,
            children,
        },
        "union" => AstNode::Union { children },
        "intersection" => AstNode::Intersection { children },
        "difference" => AstNode::Difference { children },
        "linear_extrude" => AstNode::LinearExtrude {
            height: args.number("height", Some(0))?.unwrap_or(1.0),
            center: args.boolean("center", None)?.unwrap_or(false),
            children,
        },
        "rotate_extrude" => AstNode::RotateExtrude {
            angle: args.number("angle", None)?.unwrap_or(360.0),
            fn_: args.segments(scope)?,
            children,
        },
        other => {
            log::warn!("line {}: unsupported module {}()", args.line, other);
            AstNode::unsupported(other)
        }
    };
    Ok(node)
}

/// `rotate([x, y, z])`, `rotate(a)` about Z, or `rotate(a, v)` about an axis
fn rotate(args: &Arguments, children: Vec<AstNode>) -> Result<AstNode, ParseError> {
    let Some(Value::Number(angle)) = args.get("a", Some(0)) else {
        return Ok(AstNode::Rotate {
            a: args.vec3("a", Some(0), 0.0)?.unwrap_or([0.0; 3]),
            children,
        });
    };

    match args.vec3("v", Some(1), 0.0)? {
        None => Ok(AstNode::Rotate {
            a: [0.0, 0.0, *angle],
            children,
        }),
        Some(axis) => {
            let axis = Vector3::from(axis);
            let axis = Unit::try_new(axis, f64::EPSILON)
                .ok_or_else(|| args.invalid("v", "must not be a zero vector"))?;
            let matrix = Rotation3::from_axis_angle(&axis, angle.to_radians()).to_homogeneous();
            let m = (0..3)
                .map(|r| (0..4).map(|c| matrix[(r, c)]).collect())
                .collect();
            Ok(AstNode::Multmatrix { m, children })
        }
    }
}

struct Arguments {
    module: String,
    line: usize,
    positional: Vec<Value>,
    named: AHashMap<String, Value>,
}

impl Arguments {
    fn parse(
        module: &str,
        line: usize,
        pair: Option<Pair<'_, Rule>>,
        scope: &Scope,
    ) -> Result<Self, ParseError> {
        let mut args = Self {
            module: module.to_string(),
            line,
            positional: Vec::new(),
            named: AHashMap::new(),
        };
        let Some(pair) = pair else {
            return Ok(args);
        };

        for argument in pair.into_inner() {
            if argument.as_rule() == Rule::named_argument {
                let mut parts = argument.into_inner();
                let name = parts.next().ok_or_else(|| malformed("argument"))?;
                let expr = parts.next().ok_or_else(|| malformed("argument"))?;
                args.named
                    .insert(name.as_str().to_string(), evaluate(expr, scope)?);
            } else {
                args.positional.push(evaluate(argument, scope)?);
            }
        }
        Ok(args)
    }

    fn invalid(&self, argument: &str, reason: impl Into<String>) -> ParseError {
        ParseError::InvalidArgument {
            module: self.module.clone(),
            argument: argument.to_string(),
            line: self.line,
            reason: reason.into(),
        }
    }

    fn required<T>(&self, value: Option<T>, argument: &str) -> Result<T, ParseError> {
        value.ok_or_else(|| self.invalid(argument, "is required"))
    }

    /// Named value first, then the positional slot. `undef` counts as absent.
    fn get(&self, name: &str, position: Option<usize>) -> Option<&Value> {
        self.named
            .get(name)
            .or_else(|| position.and_then(|i| self.positional.get(i)))
            .filter(|value| **value != Value::Undef)
    }

    fn number(&self, name: &str, position: Option<usize>) -> Result<Option<f64>, ParseError> {
        match self.get(name, position) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(self.invalid(
                name,
                format!("must be a number, got {}", other.describe()),
            )),
        }
    }

    fn boolean(&self, name: &str, position: Option<usize>) -> Result<Option<bool>, ParseError> {
        match self.get(name, position) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(
                name,
                format!("must be a boolean, got {}", other.describe()),
            )),
        }
    }

    fn numbers(&self, name: &str, position: Option<usize>) -> Result<Option<Vec<f64>>, ParseError> {
        match self.get(name, position) {
            None => Ok(None),
            Some(value) => self.number_list(name, value).map(Some),
        }
    }

    fn number_list(&self, name: &str, value: &Value) -> Result<Vec<f64>, ParseError> {
        let Value::Vector(items) = value else {
            return Err(self.invalid(name, format!("must be a vector, got {}", value.describe())));
        };
        items
            .iter()
            .map(|item| match item {
                Value::Number(n) => Ok(*n),
                other => Err(self.invalid(
                    name,
                    format!("must contain numbers, found {}", other.describe()),
                )),
            })
            .collect()
    }

    /// Up to three components; missing ones take `fill`
    fn vec3(
        &self,
        name: &str,
        position: Option<usize>,
        fill: f64,
    ) -> Result<Option<[f64; 3]>, ParseError> {
        let Some(values) = self.numbers(name, position)? else {
            return Ok(None);
        };
        if values.is_empty() || values.len() > 3 {
            return Err(self.invalid(
                name,
                format!("must have 1 to 3 components, got {}", values.len()),
            ));
        }
        let mut v = [fill; 3];
        v[..values.len()].copy_from_slice(&values);
        Ok(Some(v))
    }

    fn size3(&self, name: &str, position: Option<usize>) -> Result<Option<Size3>, ParseError> {
        if let Some(Value::Number(s)) = self.get(name, position) {
            return Ok(Some(Size3::Scalar(*s)));
        }
        match self.numbers(name, position)? {
            None => Ok(None),
            Some(v) if v.len() == 3 => Ok(Some(Size3::Vector([v[0], v[1], v[2]]))),
            Some(v) => Err(self.invalid(name, format!("must have 3 components, got {}", v.len()))),
        }
    }

    fn size2(&self, name: &str, position: Option<usize>) -> Result<Option<Size2>, ParseError> {
        if let Some(Value::Number(s)) = self.get(name, position) {
            return Ok(Some(Size2::Scalar(*s)));
        }
        match self.numbers(name, position)? {
            None => Ok(None),
            Some(v) if v.len() == 2 => Ok(Some(Size2::Vector([v[0], v[1]]))),
            Some(v) => Err(self.invalid(name, format!("must have 2 components, got {}", v.len()))),
        }
    }

    /// `r`, or half of `d`
    fn radius(
        &self,
        r: &str,
        d: &str,
        position: Option<usize>,
    ) -> Result<Option<f64>, ParseError> {
        match self.number(d, None)? {
            Some(diameter) if !self.named.contains_key(r) => Ok(Some(diameter / 2.0)),
            _ => self.number(r, position),
        }
    }

    /// `$fn` from the call, falling back to the enclosing scope
    fn segments(&self, scope: &Scope) -> Result<Option<u32>, ParseError> {
        let value = match self.named.get("$fn") {
            Some(value) => Some(value),
            None => scope.get("$fn"),
        };
        match value {
            None | Some(Value::Undef) => Ok(None),
            Some(Value::Number(n)) if *n >= 1.0 => Ok(Some(*n as u32)),
            Some(Value::Number(_)) => Ok(None),
            Some(other) => Err(self.invalid(
                "$fn",
                format!("must be a number, got {}", other.describe()),
            )),
        }
    }

    fn rows(
        &self,
        name: &str,
        position: Option<usize>,
    ) -> Result<Option<Vec<Vec<f64>>>, ParseError> {
        match self.get(name, position) {
            None => Ok(None),
            Some(Value::Vector(rows)) => rows
                .iter()
                .map(|row| self.number_list(name, row))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.invalid(
                name,
                format!("must be a vector, got {}", other.describe()),
            )),
        }
    }

    fn points2(
        &self,
        name: &str,
        position: Option<usize>,
    ) -> Result<Option<Vec<[f64; 2]>>, ParseError> {
        let Some(rows) = self.rows(name, position)? else {
            return Ok(None);
        };
        rows.into_iter()
            .map(|row| match row.as_slice() {
                [x, y] => Ok([*x, *y]),
                _ => Err(self.invalid(name, "points must have 2 components")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn points3(
        &self,
        name: &str,
        position: Option<usize>,
    ) -> Result<Option<Vec<[f64; 3]>>, ParseError> {
        let Some(rows) = self.rows(name, position)? else {
            return Ok(None);
        };
        rows.into_iter()
            .map(|row| match row.as_slice() {
                [x, y, z] => Ok([*x, *y, *z]),
                _ => Err(self.invalid(name, "points must have 3 components")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn faces(
        &self,
        name: &str,
        position: Option<usize>,
    ) -> Result<Option<Vec<Vec<usize>>>, ParseError> {
        let Some(rows) = self.rows(name, position)? else {
            return Ok(None);
        };
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|i| {
                        if i >= 0.0 && i.fract() == 0.0 {
                            Ok(i as usize)
                        } else {
                            Err(self.invalid(name, format!("index {} is not a point index", i)))
                        }
                    })
                    .collect::<Result<Vec<usize>, ParseError>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn matrix(
        &self,
        name: &str,
        position: Option<usize>,
    ) -> Result<Option<Vec<Vec<f64>>>, ParseError> {
        self.rows(name, position)
    }
}

fn evaluate(pair: Pair<'_, Rule>, scope: &Scope) -> Result<Value, ParseError> {
    let line = pair.line_col().0;
    match pair.as_rule() {
        Rule::expr | Rule::product => {
            let mut parts = pair.into_inner();
            let first = parts.next().ok_or_else(|| malformed("expression"))?;
            let mut acc = evaluate(first, scope)?;
            while let Some(op) = parts.next() {
                let rhs = parts.next().ok_or_else(|| malformed("expression"))?;
                acc = binary(op.as_str(), acc, evaluate(rhs, scope)?, line)?;
            }
            Ok(acc)
        }
        Rule::unary => {
            let mut negations = 0;
            let mut operand = None;
            for part in pair.into_inner() {
                if part.as_rule() == Rule::neg {
                    negations += 1;
                } else {
                    operand = Some(evaluate(part, scope)?);
                }
            }
            let value = operand.ok_or_else(|| malformed("expression"))?;
            if negations % 2 == 1 {
                negate(value, line)
            } else {
                Ok(value)
            }
        }
        Rule::number => pair
            .as_str()
            .parse()
            .map(Value::Number)
            .map_err(|_| ParseError::Expression {
                line,
                reason: format!("invalid number '{}'", pair.as_str()),
            }),
        Rule::boolean => Ok(Value::Bool(pair.as_str() == "true")),
        Rule::undef => Ok(Value::Undef),
        Rule::string => Ok(Value::Str(
            pair.into_inner()
                .next()
                .map(|text| text.as_str().to_string())
                .unwrap_or_default(),
        )),
        Rule::vector => pair
            .into_inner()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),
        Rule::ident => {
            let name = pair.as_str();
            match scope.get(name) {
                Some(value) => Ok(value.clone()),
                None if name == "PI" => Ok(Value::Number(std::f64::consts::PI)),
                None => Err(ParseError::UnknownVariable {
                    name: name.to_string(),
                    line,
                }),
            }
        }
        other => Err(ParseError::Expression {
            line,
            reason: format!("unexpected {:?}", other),
        }),
    }
}

fn negate(value: Value, line: usize) -> Result<Value, ParseError> {
    match value {
        Value::Number(n) => Ok(Value::Number(-n)),
        Value::Vector(items) => items
            .into_iter()
            .map(|item| negate(item, line))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),
        other => Err(ParseError::Expression {
            line,
            reason: format!("cannot negate {}", other.describe()),
        }),
    }
}

fn binary(op: &str, lhs: Value, rhs: Value, line: usize) -> Result<Value, ParseError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => {
            let result = match op {
                "+" => a + b,
                "-" => a - b,
                "*" => a * b,
                "/" => a / b,
                _ => a % b,
            };
            Ok(Value::Number(result))
        }
        (Value::Vector(a), Value::Vector(b)) if (op == "+" || op == "-") && a.len() == b.len() => a
            .into_iter()
            .zip(b)
            .map(|(x, y)| binary(op, x, y, line))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),
        (Value::Vector(a), Value::Number(b)) if op == "*" || op == "/" => a
            .into_iter()
            .map(|x| binary(op, x, Value::Number(b), line))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),
        (Value::Number(a), Value::Vector(b)) if op == "*" => b
            .into_iter()
            .map(|y| binary(op, Value::Number(a), y, line))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),
        (lhs, rhs) => Err(ParseError::Expression {
            line,
            reason: format!(
                "cannot apply '{}' to {} and {}",
                op,
                lhs.describe(),
                rhs.describe()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> AstNode {
        let mut nodes = parse_scad(source).unwrap();
        assert_eq!(nodes.len(), 1, "expected a single root in {:?}", nodes);
        nodes.remove(0)
    }

    #[test]
    fn test_parse_cube() {
        assert_eq!(
            parse_one("cube([10, 10, 10]);"),
            AstNode::Cube {
                size: Size3::Vector([10.0, 10.0, 10.0]),
                center: false
            }
        );
        assert_eq!(
            parse_one("cube(size = 2, center = true);"),
            AstNode::Cube {
                size: Size3::Scalar(2.0),
                center: true
            }
        );
    }

    #[test]
    fn test_parse_transform() {
        assert_eq!(
            parse_one("translate([5, 0, 0]) cube([10, 10, 10]);"),
            AstNode::Translate {
                v: [5.0, 0.0, 0.0],
                children: vec![AstNode::Cube {
                    size: Size3::Vector([10.0, 10.0, 10.0]),
                    center: false
                }],
            }
        );
    }

    #[test]
    fn test_parse_boolean() {
        let node = parse_one("difference() { cube(10); sphere(8); }");
        assert_eq!(node.kind(), "difference");
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[1], AstNode::Sphere { r: 8.0, fn_: None });
    }

    #[test]
    fn test_parse_variables_and_arithmetic() {
        let code = r#"// Parametric box
width = 50;
depth = 40;
wall = 2;

difference() {
    cube([width, depth, 30]);
    translate([wall, wall, wall]) cube([width - wall * 2, depth - 2 * wall, 30]);
}"#;
        let node = parse_one(code);
        let inner = &node.children()[1].children()[0];
        assert_eq!(
            *inner,
            AstNode::Cube {
                size: Size3::Vector([46.0, 36.0, 30.0]),
                center: false
            }
        );
    }

    #[test]
    fn test_block_scope_and_hoisting() {
        let nodes = parse_scad("sphere(r); r = 3; { r = 5; sphere(r); }").unwrap();
        assert_eq!(nodes[0], AstNode::Sphere { r: 3.0, fn_: None });
        assert_eq!(nodes[1], AstNode::Sphere { r: 5.0, fn_: None });
    }

    #[test]
    fn test_dollar_fn_from_scope() {
        let nodes = parse_scad("$fn = 12; sphere(1); cylinder(h = 2, r = 1, $fn = 6);").unwrap();
        assert_eq!(nodes[0], AstNode::Sphere { r: 1.0, fn_: Some(12) });
        assert!(matches!(nodes[1], AstNode::Cylinder { fn_: Some(6), .. }));
    }

    #[test]
    fn test_cylinder_radii() {
        let node = parse_one("cylinder(h = 10, d1 = 4, r2 = 1, center = true);");
        assert_eq!(
            node,
            AstNode::Cylinder {
                h: 10.0,
                r: None,
                r1: Some(2.0),
                r2: Some(1.0),
                center: true,
                fn_: None
            }
        );
    }

    #[test]
    fn test_rotate_forms() {
        assert_eq!(
            parse_one("rotate(90) cube(1);"),
            AstNode::Rotate {
                a: [0.0, 0.0, 90.0],
                children: vec![AstNode::Cube {
                    size: Size3::Scalar(1.0),
                    center: false
                }],
            }
        );
        assert_eq!(
            parse_one("rotate(a = 90, v = [1, 0, 0]) cube(1);").kind(),
            "multmatrix"
        );
    }

    #[test]
    fn test_modifiers() {
        let nodes = parse_scad("*cube(1); #sphere(2); %cylinder(h = 1, r = 1);").unwrap();
        assert_eq!(nodes, vec![AstNode::Sphere { r: 2.0, fn_: None }]);

        // background parts inside a tree are dropped too
        let node = parse_one("union() { cube(1); %sphere(5); }");
        assert_eq!(
            node,
            AstNode::Union {
                children: vec![AstNode::Cube {
                    size: Size3::Scalar(1.0),
                    center: false,
                }],
            }
        );
    }

    #[test]
    fn test_root_modifier_replaces_program() {
        let nodes = parse_scad("cube(10); translate([5, 0, 0]) !sphere(1); cylinder(h = 1);")
            .unwrap();
        // the subtree keeps none of its parents' transforms
        assert_eq!(nodes, vec![AstNode::Sphere { r: 1.0, fn_: None }]);

        let nodes = parse_scad("!union() { cube(1); !sphere(2); } !cube(3);").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), "union");

        // a disabled subtree is never evaluated, so its `!` is inert
        let nodes = parse_scad("cube(1); *union() { !sphere(2); }").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), "cube");
    }

    #[test]
    fn test_unknown_module_is_unsupported() {
        assert_eq!(
            parse_one("minkowski() { cube(1); sphere(1); }"),
            AstNode::unsupported("minkowski")
        );
    }

    #[test]
    fn test_color_and_extrude() {
        let node = parse_one(r#"color("red", 0.5) linear_extrude(height = 3) circle(d = 4);"#);
        let AstNode::Color { c, alpha, children } = node else {
            panic!("expected color node");
        };
        assert_eq!(c, ColorSpec::Name("red".into()));
        assert_eq!(alpha, Some(0.5));
        assert_eq!(
            children[0],
            AstNode::LinearExtrude {
                height: 3.0,
                center: false,
                children: vec![AstNode::Circle { r: 2.0, fn_: None }],
            }
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_scad("cube(size);"),
            Err(ParseError::UnknownVariable { .. })
        ));
        assert!(matches!(parse_scad("cube(1"), Err(ParseError::Syntax(_))));
        assert!(matches!(
            parse_scad(r#"cube(center = "yes");"#),
            Err(ParseError::InvalidArgument { .. })
        ));
        assert!(matches!(
            parse_scad("polygon();"),
            Err(ParseError::InvalidArgument { .. })
        ));
    }
}
