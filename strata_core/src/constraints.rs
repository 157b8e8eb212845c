// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box layout constraints.
//!
//! A [`BoxConstraints`] describes the range of sizes a parent permits its
//! child to take. Every operation is pure and returns a new value; an axis may
//! be unbounded (`max = f64::INFINITY`) independently of the other.
//!
//! Constraints are *normalized* when both minima are non-negative and each
//! minimum is at most its maximum. Most operations assume normalized input;
//! [`BoxConstraints::debug_assert_is_valid`] reports exactly which fields are
//! at fault when that does not hold.

use std::fmt;
use std::ops::{Div, Mul, Rem};

use kurbo::{Insets, Size};

/// Immutable min/max width and height bounds for box layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxConstraints {
    /// Minimum width a box may take.
    pub min_width: f64,
    /// Maximum width a box may take; may be infinite.
    pub max_width: f64,
    /// Minimum height a box may take.
    pub min_height: f64,
    /// Maximum height a box may take; may be infinite.
    pub max_height: f64,
}

/// The specific way in which a [`BoxConstraints`] value is malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintsViolation {
    /// One or more fields are NaN; names the fields in declaration order.
    #[error("BoxConstraints has NaN values in {}.", join_fields(.0))]
    NaN(Vec<&'static str>),
    /// Both minima are negative.
    #[error("BoxConstraints has both a negative minimum width and a negative minimum height.")]
    NegativeMinWidthAndHeight,
    /// Minimum width is negative.
    #[error("BoxConstraints has a negative minimum width.")]
    NegativeMinWidth,
    /// Minimum height is negative.
    #[error("BoxConstraints has a negative minimum height.")]
    NegativeMinHeight,
    /// Both axes have `max < min`.
    #[error("BoxConstraints has both width and height constraints non-normalized.")]
    NonNormalizedWidthAndHeight,
    /// The width axis has `max < min`.
    #[error("BoxConstraints has non-normalized width constraints.")]
    NonNormalizedWidth,
    /// The height axis has `max < min`.
    #[error("BoxConstraints has non-normalized height constraints.")]
    NonNormalizedHeight,
    /// Applied constraints force an infinite size on both axes.
    #[error("BoxConstraints forces an infinite width and infinite height.")]
    ForcesInfiniteWidthAndHeight,
    /// Applied constraints force an infinite width.
    #[error("BoxConstraints forces an infinite width.")]
    ForcesInfiniteWidth,
    /// Applied constraints force an infinite height.
    #[error("BoxConstraints forces an infinite height.")]
    ForcesInfiniteHeight,
    /// `lerp` was asked to interpolate a bounded axis with an unbounded one.
    #[error("Cannot interpolate between finite constraints and unbounded constraints.")]
    CannotInterpolate,
}

/// A [`ConstraintsViolation`] together with the offending value.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{violation}\nThe offending constraints were:\n  {constraints}")]
pub struct ConstraintsError {
    /// What is wrong.
    pub violation: ConstraintsViolation,
    /// The constraints that failed validation.
    pub constraints: BoxConstraints,
}

/// Joins field names the way a sentence would: `a`, `a and b`, `a, b, and c`.
fn join_fields(fields: &[&'static str]) -> String {
    match fields {
        [] => String::new(),
        [one] => String::from(*one),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => {
            let mut out = rest.join(", ");
            out.push_str(", and ");
            out.push_str(last);
            out
        }
    }
}

/// Clamps without panicking on inverted bounds.
#[inline]
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

impl BoxConstraints {
    /// Constraints that allow any size at all.
    pub const UNCONSTRAINED: Self = Self::new(0.0, f64::INFINITY, 0.0, f64::INFINITY);

    /// Creates constraints from explicit bounds.
    #[inline]
    #[must_use]
    pub const fn new(min_width: f64, max_width: f64, min_height: f64, max_height: f64) -> Self {
        Self {
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }

    /// Constraints that are satisfied only by `size`.
    #[must_use]
    pub const fn tight(size: Size) -> Self {
        Self::new(size.width, size.width, size.height, size.height)
    }

    /// Tight on the given axes, unconstrained on the others.
    #[must_use]
    pub fn tight_for(width: Option<f64>, height: Option<f64>) -> Self {
        Self::new(
            width.unwrap_or(0.0),
            width.unwrap_or(f64::INFINITY),
            height.unwrap_or(0.0),
            height.unwrap_or(f64::INFINITY),
        )
    }

    /// Tight on each axis whose value is finite, unconstrained otherwise.
    #[must_use]
    pub fn tight_for_finite(width: f64, height: f64) -> Self {
        let w = (width != f64::INFINITY).then_some(width);
        let h = (height != f64::INFINITY).then_some(height);
        Self::tight_for(w, h)
    }

    /// Constraints that forbid sizes larger than `size`.
    #[must_use]
    pub const fn loose(size: Size) -> Self {
        Self::new(0.0, size.width, 0.0, size.height)
    }

    /// Constraints that expand to fill the given axes, or infinitely if absent.
    #[must_use]
    pub fn expand(width: Option<f64>, height: Option<f64>) -> Self {
        let w = width.unwrap_or(f64::INFINITY);
        let h = height.unwrap_or(f64::INFINITY);
        Self::new(w, w, h, h)
    }

    /// Returns a copy with the given fields replaced.
    #[must_use]
    pub fn copy_with(
        &self,
        min_width: Option<f64>,
        max_width: Option<f64>,
        min_height: Option<f64>,
        max_height: Option<f64>,
    ) -> Self {
        Self::new(
            min_width.unwrap_or(self.min_width),
            max_width.unwrap_or(self.max_width),
            min_height.unwrap_or(self.min_height),
            max_height.unwrap_or(self.max_height),
        )
    }

    /// Shrinks the constraints by the given insets, never below zero.
    #[must_use]
    pub fn deflate(&self, insets: Insets) -> Self {
        let horizontal = insets.x_value();
        let vertical = insets.y_value();
        let min_width = (self.min_width - horizontal).max(0.0);
        let min_height = (self.min_height - vertical).max(0.0);
        Self::new(
            min_width,
            min_width.max(self.max_width - horizontal),
            min_height,
            min_height.max(self.max_height - vertical),
        )
    }

    /// Removes the minimum width and height requirements.
    #[must_use]
    pub const fn loosen(&self) -> Self {
        Self::new(0.0, self.max_width, 0.0, self.max_height)
    }

    /// Returns constraints that respect `self` as closely as possible while
    /// staying within `other`.
    #[must_use]
    pub fn enforce(&self, other: &Self) -> Self {
        Self::new(
            clamp(self.min_width, other.min_width, other.max_width),
            clamp(self.max_width, other.min_width, other.max_width),
            clamp(self.min_height, other.min_height, other.max_height),
            clamp(self.max_height, other.min_height, other.max_height),
        )
    }

    /// Tightens the given axes to the given values, as close to the original
    /// bounds as possible.
    #[must_use]
    pub fn tighten(&self, width: Option<f64>, height: Option<f64>) -> Self {
        let (min_width, max_width) = match width {
            Some(w) => {
                let w = clamp(w, self.min_width, self.max_width);
                (w, w)
            }
            None => (self.min_width, self.max_width),
        };
        let (min_height, max_height) = match height {
            Some(h) => {
                let h = clamp(h, self.min_height, self.max_height);
                (h, h)
            }
            None => (self.min_height, self.max_height),
        };
        Self::new(min_width, max_width, min_height, max_height)
    }

    /// Swaps the width and height axes.
    #[must_use]
    pub const fn flipped(&self) -> Self {
        Self::new(
            self.min_height,
            self.max_height,
            self.min_width,
            self.max_width,
        )
    }

    /// Keeps only the width bounds.
    #[must_use]
    pub const fn width_constraints(&self) -> Self {
        Self::new(self.min_width, self.max_width, 0.0, f64::INFINITY)
    }

    /// Keeps only the height bounds.
    #[must_use]
    pub const fn height_constraints(&self) -> Self {
        Self::new(0.0, f64::INFINITY, self.min_height, self.max_height)
    }

    /// Clamps `width` into the width bounds.
    #[must_use]
    pub fn constrain_width(&self, width: f64) -> f64 {
        clamp(width, self.min_width, self.max_width)
    }

    /// Clamps `height` into the height bounds.
    #[must_use]
    pub fn constrain_height(&self, height: f64) -> f64 {
        clamp(height, self.min_height, self.max_height)
    }

    /// Returns the size closest to `size` that satisfies these constraints.
    #[must_use]
    pub fn constrain(&self, size: Size) -> Size {
        Size::new(
            self.constrain_width(size.width),
            self.constrain_height(size.height),
        )
    }

    /// Like [`constrain`](Self::constrain) for a width and height pair.
    #[must_use]
    pub fn constrain_dimensions(&self, width: f64, height: f64) -> Size {
        Size::new(self.constrain_width(width), self.constrain_height(height))
    }

    /// Returns a size that satisfies the constraints while keeping the aspect
    /// ratio of `size` where possible.
    ///
    /// `size` must have a positive width and height unless the constraints
    /// are tight.
    #[must_use]
    pub fn constrain_size_and_attempt_to_preserve_aspect_ratio(&self, size: Size) -> Size {
        if self.is_tight() {
            return self.smallest();
        }
        debug_assert!(
            size.width > 0.0 && size.height > 0.0,
            "cannot preserve the aspect ratio of an empty size: {size:?}"
        );
        let aspect_ratio = size.width / size.height;
        let mut width = size.width;
        let mut height = size.height;
        if width > self.max_width {
            width = self.max_width;
            height = width / aspect_ratio;
        }
        if height > self.max_height {
            height = self.max_height;
            width = height * aspect_ratio;
        }
        if width < self.min_width {
            width = self.min_width;
            height = width / aspect_ratio;
        }
        if height < self.min_height {
            height = self.min_height;
            width = height * aspect_ratio;
        }
        self.constrain_dimensions(width, height)
    }

    /// The largest size that satisfies the constraints.
    #[must_use]
    pub fn biggest(&self) -> Size {
        self.constrain_dimensions(f64::INFINITY, f64::INFINITY)
    }

    /// The smallest size that satisfies the constraints.
    #[must_use]
    pub fn smallest(&self) -> Size {
        self.constrain_dimensions(0.0, 0.0)
    }

    /// Whether exactly one width satisfies the constraints.
    #[must_use]
    pub fn has_tight_width(&self) -> bool {
        self.min_width >= self.max_width
    }

    /// Whether exactly one height satisfies the constraints.
    #[must_use]
    pub fn has_tight_height(&self) -> bool {
        self.min_height >= self.max_height
    }

    /// Whether exactly one size satisfies the constraints.
    #[must_use]
    pub fn is_tight(&self) -> bool {
        self.has_tight_width() && self.has_tight_height()
    }

    /// Whether there is an upper bound on width.
    #[must_use]
    pub fn has_bounded_width(&self) -> bool {
        self.max_width < f64::INFINITY
    }

    /// Whether there is an upper bound on height.
    #[must_use]
    pub fn has_bounded_height(&self) -> bool {
        self.max_height < f64::INFINITY
    }

    /// Whether the width is forced to be infinite.
    #[must_use]
    pub fn has_infinite_width(&self) -> bool {
        self.min_width >= f64::INFINITY
    }

    /// Whether the height is forced to be infinite.
    #[must_use]
    pub fn has_infinite_height(&self) -> bool {
        self.min_height >= f64::INFINITY
    }

    /// Whether `size` lies within the bounds.
    #[must_use]
    pub fn is_satisfied_by(&self, size: Size) -> bool {
        self.min_width <= size.width
            && size.width <= self.max_width
            && self.min_height <= size.height
            && size.height <= self.max_height
    }

    /// Whether both minima are non-negative and each is at most its maximum.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.min_width >= 0.0
            && self.min_width <= self.max_width
            && self.min_height >= 0.0
            && self.min_height <= self.max_height
    }

    /// Returns normalized constraints that keep the minima.
    ///
    /// Negative minima become zero; a maximum below its minimum is raised.
    #[must_use]
    pub fn normalize(&self) -> Self {
        if self.is_normalized() {
            return *self;
        }
        let min_width = if self.min_width >= 0.0 {
            self.min_width
        } else {
            0.0
        };
        let min_height = if self.min_height >= 0.0 {
            self.min_height
        } else {
            0.0
        };
        Self::new(
            min_width,
            if min_width > self.max_width {
                min_width
            } else {
                self.max_width
            },
            min_height,
            if min_height > self.max_height {
                min_height
            } else {
                self.max_height
            },
        )
    }

    /// Checks the constraints and reports the first problem found.
    ///
    /// `is_applied_constraint` additionally rejects constraints that would
    /// force an infinite size, which is an error only once the constraints
    /// are handed to a child.
    pub fn debug_assert_is_valid(&self, is_applied_constraint: bool) -> Result<(), ConstraintsError> {
        self.check(is_applied_constraint).map_err(|violation| ConstraintsError {
            violation,
            constraints: *self,
        })
    }

    fn check(&self, is_applied_constraint: bool) -> Result<(), ConstraintsViolation> {
        let nan: Vec<&'static str> = [
            ("minWidth", self.min_width),
            ("maxWidth", self.max_width),
            ("minHeight", self.min_height),
            ("maxHeight", self.max_height),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_nan())
        .map(|(name, _)| name)
        .collect();
        if !nan.is_empty() {
            return Err(ConstraintsViolation::NaN(nan));
        }
        match (self.min_width < 0.0, self.min_height < 0.0) {
            (true, true) => return Err(ConstraintsViolation::NegativeMinWidthAndHeight),
            (true, false) => return Err(ConstraintsViolation::NegativeMinWidth),
            (false, true) => return Err(ConstraintsViolation::NegativeMinHeight),
            (false, false) => {}
        }
        match (
            self.max_width < self.min_width,
            self.max_height < self.min_height,
        ) {
            (true, true) => return Err(ConstraintsViolation::NonNormalizedWidthAndHeight),
            (true, false) => return Err(ConstraintsViolation::NonNormalizedWidth),
            (false, true) => return Err(ConstraintsViolation::NonNormalizedHeight),
            (false, false) => {}
        }
        if is_applied_constraint {
            match (
                self.min_width.is_infinite(),
                self.min_height.is_infinite(),
            ) {
                (true, true) => return Err(ConstraintsViolation::ForcesInfiniteWidthAndHeight),
                (true, false) => return Err(ConstraintsViolation::ForcesInfiniteWidth),
                (false, true) => return Err(ConstraintsViolation::ForcesInfiniteHeight),
                (false, false) => {}
            }
        }
        Ok(())
    }

    /// Linearly interpolates between two constraints.
    ///
    /// A missing side is treated as zero constraints. Each axis bound must be
    /// finite on both sides or infinite on both sides.
    pub fn lerp(
        a: Option<&Self>,
        b: Option<&Self>,
        t: f64,
    ) -> Result<Option<Self>, ConstraintsError> {
        let (a, b) = match (a, b) {
            (None, None) => return Ok(None),
            (None, Some(b)) => return Ok(Some(*b * t)),
            (Some(a), None) => return Ok(Some(*a * (1.0 - t))),
            (Some(a), Some(b)) => (a, b),
        };
        a.debug_assert_is_valid(false)?;
        b.debug_assert_is_valid(false)?;
        let pairs = [
            (a.min_width, b.min_width),
            (a.max_width, b.max_width),
            (a.min_height, b.min_height),
            (a.max_height, b.max_height),
        ];
        for (x, y) in pairs {
            let both_finite = x.is_finite() && y.is_finite();
            let both_infinite = x == f64::INFINITY && y == f64::INFINITY;
            if !both_finite && !both_infinite {
                return Err(ConstraintsError {
                    violation: ConstraintsViolation::CannotInterpolate,
                    constraints: *if x.is_finite() { b } else { a },
                });
            }
        }
        let mix = |x: f64, y: f64| {
            if x.is_finite() {
                x + (y - x) * t
            } else {
                f64::INFINITY
            }
        };
        Ok(Some(Self::new(
            mix(a.min_width, b.min_width),
            mix(a.max_width, b.max_width),
            mix(a.min_height, b.min_height),
            mix(a.max_height, b.max_height),
        )))
    }
}

impl Default for BoxConstraints {
    fn default() -> Self {
        Self::UNCONSTRAINED
    }
}

impl Mul<f64> for BoxConstraints {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(
            self.min_width * factor,
            self.max_width * factor,
            self.min_height * factor,
            self.max_height * factor,
        )
    }
}

impl Div<f64> for BoxConstraints {
    type Output = Self;

    fn div(self, factor: f64) -> Self {
        Self::new(
            self.min_width / factor,
            self.max_width / factor,
            self.min_height / factor,
            self.max_height / factor,
        )
    }
}

impl Rem<f64> for BoxConstraints {
    type Output = Self;

    fn rem(self, value: f64) -> Self {
        Self::new(
            self.min_width % value,
            self.max_width % value,
            self.min_height % value,
            self.max_height % value,
        )
    }
}

struct Bound(f64);

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == f64::INFINITY {
            f.write_str("Infinity")
        } else {
            write!(f, "{:.1}", self.0)
        }
    }
}

fn describe_axis(f: &mut fmt::Formatter<'_>, min: f64, max: f64, dim: &str) -> fmt::Result {
    if min == max {
        write!(f, "{dim}={}", Bound(min))
    } else {
        write!(f, "{}<={dim}<={}", Bound(min), Bound(max))
    }
}

impl fmt::Display for BoxConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let annotation = if self.is_normalized() {
            ""
        } else {
            "; NOT NORMALIZED"
        };
        if self.min_width == f64::INFINITY && self.min_height == f64::INFINITY {
            return write!(f, "BoxConstraints(biggest{annotation})");
        }
        if self.min_width == 0.0
            && self.max_width == f64::INFINITY
            && self.min_height == 0.0
            && self.max_height == f64::INFINITY
        {
            return write!(f, "BoxConstraints(unconstrained{annotation})");
        }
        f.write_str("BoxConstraints(")?;
        describe_axis(f, self.min_width, self.max_width, "w")?;
        f.write_str(", ")?;
        describe_axis(f, self.min_height, self.max_height, "h")?;
        write!(f, "{annotation})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrain_satisfies_normalized_constraints() {
        let constraints = [
            BoxConstraints::new(0.0, 100.0, 0.0, 50.0),
            BoxConstraints::new(10.0, 10.0, 0.0, f64::INFINITY),
            BoxConstraints::new(5.0, f64::INFINITY, 7.0, 7.0),
            BoxConstraints::UNCONSTRAINED,
        ];
        let sizes = [
            Size::ZERO,
            Size::new(200.0, 20.0),
            Size::new(3.0, 1000.0),
            Size::new(f64::INFINITY, 4.0),
        ];
        for c in constraints {
            for s in sizes {
                let result = c.constrain(s);
                assert!(c.is_satisfied_by(result), "{c} does not accept {result:?}");
            }
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            BoxConstraints::new(-5.0, 10.0, 3.0, 1.0),
            BoxConstraints::new(20.0, 10.0, -1.0, -2.0),
            BoxConstraints::new(0.0, 10.0, 0.0, 10.0),
        ];
        for c in samples {
            let n = c.normalize();
            assert!(n.is_normalized());
            assert_eq!(n.normalize(), n);
        }
        let already = BoxConstraints::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(already.normalize(), already);
    }

    #[test]
    fn normalize_raises_max_to_min() {
        let n = BoxConstraints::new(20.0, 10.0, -1.0, 5.0).normalize();
        assert_eq!(n, BoxConstraints::new(20.0, 20.0, 0.0, 5.0));
    }

    #[test]
    fn loose_child_is_clamped_by_parent() {
        let parent = BoxConstraints::new(0.0, 100.0, 0.0, 50.0);
        let child = BoxConstraints::loose(Size::new(200.0, 20.0));
        let size = parent.constrain(child.biggest());
        assert_eq!(size, Size::new(100.0, 20.0));
    }

    #[test]
    fn deflate_never_goes_negative() {
        let c = BoxConstraints::new(5.0, 30.0, 0.0, 8.0);
        let d = c.deflate(Insets::uniform(10.0));
        assert_eq!(d, BoxConstraints::new(0.0, 10.0, 0.0, 0.0));
    }

    #[test]
    fn enforce_and_tighten() {
        let outer = BoxConstraints::new(10.0, 20.0, 10.0, 20.0);
        let inner = BoxConstraints::new(0.0, 100.0, 15.0, 15.0);
        assert_eq!(
            inner.enforce(&outer),
            BoxConstraints::new(10.0, 20.0, 15.0, 15.0)
        );
        let t = outer.tighten(Some(100.0), None);
        assert_eq!(t, BoxConstraints::new(20.0, 20.0, 10.0, 20.0));
        assert!(t.has_tight_width());
        assert!(!t.is_tight());
    }

    #[test]
    fn tight_for_finite_ignores_infinite_axis() {
        let c = BoxConstraints::tight_for_finite(10.0, f64::INFINITY);
        assert_eq!(c, BoxConstraints::new(10.0, 10.0, 0.0, f64::INFINITY));
    }

    #[test]
    fn unbounded_axis_is_independent() {
        let c = BoxConstraints::new(0.0, 100.0, 0.0, f64::INFINITY);
        assert!(c.has_bounded_width());
        assert!(!c.has_bounded_height());
        assert_eq!(c.biggest(), Size::new(100.0, f64::INFINITY));
    }

    #[test]
    fn nan_fields_are_enumerated() {
        let c = BoxConstraints::new(f64::NAN, f64::NAN, f64::NAN, 1.0);
        let err = c.debug_assert_is_valid(false).unwrap_err();
        assert_eq!(
            err.violation,
            ConstraintsViolation::NaN(vec!["minWidth", "maxWidth", "minHeight"])
        );
        let message = err.to_string();
        assert!(
            message.starts_with("BoxConstraints has NaN values in minWidth, maxWidth, and minHeight."),
            "{message}"
        );
        let two = BoxConstraints::new(0.0, f64::NAN, 0.0, f64::NAN)
            .debug_assert_is_valid(false)
            .unwrap_err();
        assert_eq!(
            two.violation.to_string(),
            "BoxConstraints has NaN values in maxWidth and maxHeight."
        );
    }

    #[test]
    fn non_normalized_axes_are_reported() {
        let width = BoxConstraints::new(10.0, 5.0, 0.0, 1.0);
        assert_eq!(
            width.debug_assert_is_valid(false).unwrap_err().violation,
            ConstraintsViolation::NonNormalizedWidth
        );
        let both = BoxConstraints::new(10.0, 5.0, 3.0, 1.0);
        assert_eq!(
            both.debug_assert_is_valid(false).unwrap_err().violation,
            ConstraintsViolation::NonNormalizedWidthAndHeight
        );
        let negative = BoxConstraints::new(-1.0, 5.0, 0.0, 1.0);
        assert_eq!(
            negative.debug_assert_is_valid(false).unwrap_err().violation,
            ConstraintsViolation::NegativeMinWidth
        );
    }

    #[test]
    fn applied_constraints_reject_infinite_minimum() {
        let c = BoxConstraints::expand(None, Some(10.0));
        assert!(c.debug_assert_is_valid(false).is_ok());
        assert_eq!(
            c.debug_assert_is_valid(true).unwrap_err().violation,
            ConstraintsViolation::ForcesInfiniteWidth
        );
    }

    #[test]
    fn lerp_interpolates_finite_bounds() {
        let a = BoxConstraints::new(0.0, 10.0, 0.0, f64::INFINITY);
        let b = BoxConstraints::new(10.0, 20.0, 4.0, f64::INFINITY);
        let mid = BoxConstraints::lerp(Some(&a), Some(&b), 0.5).unwrap().unwrap();
        assert_eq!(mid, BoxConstraints::new(5.0, 15.0, 2.0, f64::INFINITY));
        assert_eq!(BoxConstraints::lerp(None, None, 0.5).unwrap(), None);
        assert_eq!(
            BoxConstraints::lerp(Some(&b), None, 0.5).unwrap(),
            Some(b * 0.5)
        );
    }

    #[test]
    fn lerp_rejects_bounded_to_unbounded() {
        let a = BoxConstraints::new(0.0, 10.0, 0.0, 10.0);
        let b = BoxConstraints::new(0.0, f64::INFINITY, 0.0, 10.0);
        let err = BoxConstraints::lerp(Some(&a), Some(&b), 0.5).unwrap_err();
        assert_eq!(err.violation, ConstraintsViolation::CannotInterpolate);
    }

    #[test]
    fn aspect_ratio_is_preserved_within_bounds() {
        let c = BoxConstraints::new(0.0, 100.0, 0.0, 100.0);
        let size = c.constrain_size_and_attempt_to_preserve_aspect_ratio(Size::new(400.0, 200.0));
        assert_eq!(size, Size::new(100.0, 50.0));
    }

    #[test]
    fn display_matches_debug_strings() {
        assert_eq!(
            BoxConstraints::UNCONSTRAINED.to_string(),
            "BoxConstraints(unconstrained)"
        );
        assert_eq!(
            BoxConstraints::expand(None, None).to_string(),
            "BoxConstraints(biggest)"
        );
        assert_eq!(
            BoxConstraints::new(10.0, 10.0, 0.0, f64::INFINITY).to_string(),
            "BoxConstraints(w=10.0, 0.0<=h<=Infinity)"
        );
        assert_eq!(
            BoxConstraints::new(10.0, 5.0, 0.0, 1.0).to_string(),
            "BoxConstraints(10.0<=w<=5.0, 0.0<=h<=1.0; NOT NORMALIZED)"
        );
    }

    #[test]
    fn flipped_and_axis_constraints() {
        let c = BoxConstraints::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(c.flipped(), BoxConstraints::new(3.0, 4.0, 1.0, 2.0));
        assert_eq!(
            c.width_constraints(),
            BoxConstraints::new(1.0, 2.0, 0.0, f64::INFINITY)
        );
        assert_eq!(c / 2.0, BoxConstraints::new(0.5, 1.0, 1.5, 2.0));
    }
}
