use std::fmt;
use std::str::FromStr;

use ndcube_math::Float;
use ndcube_shape::SchlafliProduct;
use regex::Regex;

use crate::PrescriptionError;

lazy_static! {
    static ref PRESCRIPTION_REGEX: Regex = Regex::new(r"^\s*(.+?)\s+(\S+)\s*$").expect("bad regex");
    static ref LENGTH_REGEX: Regex = Regex::new(r"^(\d+)(\((.*)\))?$").expect("bad regex");
}

/// Shape and length of a puzzle, such as `{4,3,3} 3` or `{5}x{4} 3(2.5)`.
///
/// The length is either an integer `N`, meaning `N` slices along each face
/// axis, or `N(D)` where `D` is a decimal or fraction giving the depth of the
/// slices relative to the full thickness of the puzzle. A plain decimal such
/// as `2.5` is shorthand for `3(2.5)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prescription {
    /// Shape of the puzzle.
    pub schlafli: SchlafliProduct,
    /// Length exactly as written.
    pub length_string: String,
    /// Number of slices along each face axis.
    pub int_length: u32,
    /// Slice depth, relative to the full thickness of the puzzle.
    pub double_length: Float,
}
impl fmt::Display for Prescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.schlafli, self.length_string)
    }
}
impl FromStr for Prescription {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PRESCRIPTION_REGEX
            .captures(s)
            .ok_or_else(|| PrescriptionError::Malformed(s.to_owned()))?;
        Self::new(&caps[1], &caps[2])
    }
}
impl Prescription {
    /// Parses a Schläfli product and a length.
    pub fn new(schlafli: &str, length: &str) -> Result<Self, PrescriptionError> {
        let schlafli: SchlafliProduct = schlafli.parse()?;
        let length_string = length.trim().to_owned();
        let (int_length, double_length) = parse_length(&length_string)?;
        Ok(Self {
            schlafli,
            length_string,
            int_length,
            double_length,
        })
    }

    /// Returns the number of cuts made on the near side of each face.
    pub fn num_near_cuts(&self) -> usize {
        self.int_length as usize / 2
    }
}

fn parse_length(s: &str) -> Result<(u32, Float), PrescriptionError> {
    let bad_length = || PrescriptionError::BadLength(s.to_owned());

    let (int_length, double_length) = match LENGTH_REGEX.captures(s) {
        Some(caps) => {
            let int_length: i64 = caps[1].parse().map_err(|_| bad_length())?;
            let double_length = match caps.get(3) {
                Some(inner) => parse_decimal_or_fraction(inner.as_str()).ok_or_else(bad_length)?,
                None => int_length as Float,
            };
            (int_length, double_length)
        }
        None => {
            let double_length: Float = s.parse().map_err(|_| bad_length())?;
            if !double_length.is_finite() {
                return Err(bad_length());
            }
            (double_length.ceil() as i64, double_length)
        }
    };

    if int_length < 1 {
        return Err(PrescriptionError::IntLengthTooSmall(int_length));
    }
    if double_length <= 0.0 {
        return Err(PrescriptionError::NonPositiveLength(double_length));
    }
    let int_length = u32::try_from(int_length).map_err(|_| bad_length())?;
    Ok((int_length, double_length))
}

fn parse_decimal_or_fraction(s: &str) -> Option<Float> {
    let ret = match s.split_once('/') {
        Some((n, d)) => n.trim().parse::<Float>().ok()? / d.trim().parse::<Float>().ok()?,
        None => s.trim().parse().ok()?,
    };
    ret.is_finite().then_some(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prescription() {
        let p: Prescription = "{4,3,3} 3".parse().unwrap();
        assert_eq!(p.schlafli.canonical(), "{4,3,3}");
        assert_eq!(p.int_length, 3);
        assert_eq!(p.double_length, 3.0);
        assert_eq!(p.num_near_cuts(), 1);
        assert_eq!(p.to_string(), "{4,3,3} 3");

        let p: Prescription = "  {5}x{4}   3(2.75) ".parse().unwrap();
        assert_eq!(p.schlafli.canonical(), "{5}x{4}");
        assert_eq!(p.int_length, 3);
        assert_eq!(p.double_length, 2.75);
        assert_eq!(p.length_string, "3(2.75)");

        let p: Prescription = "{3,3,3} 4(7/2)".parse().unwrap();
        assert_eq!(p.int_length, 4);
        assert_eq!(p.double_length, 3.5);

        let p: Prescription = "{4,3,3} 2.5".parse().unwrap();
        assert_eq!(p.int_length, 3);
        assert_eq!(p.double_length, 2.5);
    }

    #[test]
    fn test_bad_prescriptions() {
        assert!(matches!(
            "{4,3,3}".parse::<Prescription>(),
            Err(PrescriptionError::Malformed(_)),
        ));
        assert_eq!(
            "{4,3,3} 0".parse::<Prescription>(),
            Err(PrescriptionError::IntLengthTooSmall(0)),
        );
        assert_eq!(
            "{4,3,3} 3(0)".parse::<Prescription>(),
            Err(PrescriptionError::NonPositiveLength(0.0)),
        );
        assert!(matches!(
            "{4,3,3} 3(x)".parse::<Prescription>(),
            Err(PrescriptionError::BadLength(_)),
        ));
        assert!(matches!(
            "{4,3,3} three".parse::<Prescription>(),
            Err(PrescriptionError::BadLength(_)),
        ));
        assert!(matches!(
            "<4,3,3> 3".parse::<Prescription>(),
            Err(PrescriptionError::Schlafli(_)),
        ));
    }
}
