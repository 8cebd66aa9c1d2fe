use crate::{Error, Result};
use core::fmt;
use core::str::FromStr;

/// Number of wrench axes: force x/y/z followed by moment x/y/z.
pub const WRENCH_AXES: usize = 6;

/// Thrust-vector components contributed by each effector (in-plane x, in-plane y, spin axis).
pub const EFFECTOR_COMPONENTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    fn apply<T: nalgebra::RealField + Copy>(self, value: T) -> T {
        match self {
            Sign::Positive => value,
            Sign::Negative => -value,
        }
    }

    fn symbol(self) -> char {
        match self {
            Sign::Positive => '+',
            Sign::Negative => '-',
        }
    }
}

/// One entry of the effector layout table.
///
/// Entries never carry a magnitude, only which physical coefficient projects
/// a thrust component onto a wrench axis and with which sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Term {
    Zero,
    /// Thrust coupling coefficient.
    Coupling(Sign),
    /// Rotor drag torque coefficient.
    Torque(Sign),
    /// Moment arm projection: balance factor × arm length × thrust coupling.
    Lever(Sign),
}

/// Coefficient magnitudes the layout terms resolve to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients<T> {
    pub coupling: T,
    pub torque: T,
    pub lever: T,
}

impl Term {
    pub fn value<T: nalgebra::RealField + Copy>(self, coefficients: &Coefficients<T>) -> T {
        match self {
            Term::Zero => T::zero(),
            Term::Coupling(sign) => sign.apply(coefficients.coupling),
            Term::Torque(sign) => sign.apply(coefficients.torque),
            Term::Lever(sign) => sign.apply(coefficients.lever),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Zero => f.write_str("0"),
            Term::Coupling(sign) => write!(f, "{}mu", sign.symbol()),
            Term::Torque(sign) => write!(f, "{}km", sign.symbol()),
            Term::Lever(sign) => write!(f, "{}lever", sign.symbol()),
        }
    }
}

impl FromStr for Term {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "0" {
            return Ok(Term::Zero);
        }

        let (sign, name) = if let Some(name) = s.strip_prefix('+') {
            (Sign::Positive, name)
        } else if let Some(name) = s.strip_prefix('-') {
            (Sign::Negative, name)
        } else {
            return Err(Error::invalid_layout(format!("term `{s}` has no sign")));
        };

        match name {
            "mu" => Ok(Term::Coupling(sign)),
            "km" => Ok(Term::Torque(sign)),
            "lever" => Ok(Term::Lever(sign)),
            _ => Err(Error::invalid_layout(format!("unknown term `{s}`"))),
        }
    }
}

impl TryFrom<String> for Term {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Term> for String {
    fn from(term: Term) -> Self {
        term.to_string()
    }
}

const O: Term = Term::Zero;
const MU: Term = Term::Coupling(Sign::Positive);
const NMU: Term = Term::Coupling(Sign::Negative);
const KM: Term = Term::Torque(Sign::Positive);
const NKM: Term = Term::Torque(Sign::Negative);
const LV: Term = Term::Lever(Sign::Positive);
const NLV: Term = Term::Lever(Sign::Negative);

/// Quad tilt-rotor in X configuration, opposite effectors alternating sign.
const REFERENCE: [[Term; 12]; WRENCH_AXES] = [
    [MU, O, O, NMU, O, O, MU, O, O, NMU, O, O],
    [O, NMU, O, O, MU, O, O, NMU, O, O, MU, O],
    [O, O, MU, O, O, NMU, O, O, MU, O, O, NMU],
    [NKM, O, LV, NKM, O, NLV, NKM, O, NLV, NKM, O, LV],
    [KM, O, NLV, KM, O, NLV, KM, O, LV, KM, O, LV],
    [NLV, NLV, NKM, LV, NLV, NKM, LV, LV, NKM, NLV, LV, NKM],
];

/// Sign table describing where each effector's thrust components land on the wrench axes.
///
/// Always [`WRENCH_AXES`] rows of `3 * effectors` terms; effector `k` owns
/// columns `3k..3k + 3`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec<Term>>", into = "Vec<Vec<Term>>")
)]
pub struct Layout {
    rows: Vec<Vec<Term>>,
}

impl Layout {
    pub fn new(rows: Vec<Vec<Term>>) -> Result<Self> {
        if rows.len() != WRENCH_AXES {
            return Err(Error::invalid_layout(format!(
                "expected {WRENCH_AXES} rows, found {}",
                rows.len()
            )));
        }

        let columns = rows[0].len();
        if columns == 0 || columns % EFFECTOR_COMPONENTS != 0 {
            return Err(Error::invalid_layout(format!(
                "row length {columns} is not a positive multiple of {EFFECTOR_COMPONENTS}"
            )));
        }

        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns) {
            return Err(Error::invalid_layout(format!(
                "row {idx} has {} terms, expected {columns}",
                row.len()
            )));
        }

        Ok(Self { rows })
    }

    /// The quad tilt-rotor layout.
    pub fn reference() -> Self {
        Self {
            rows: REFERENCE.iter().map(|row| row.to_vec()).collect(),
        }
    }

    pub fn effectors(&self) -> usize {
        self.columns() / EFFECTOR_COMPONENTS
    }

    pub fn columns(&self) -> usize {
        self.rows[0].len()
    }

    pub fn rows(&self) -> &[Vec<Term>] {
        &self.rows
    }

    pub fn term(&self, row: usize, column: usize) -> Term {
        self.rows[row][column]
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::reference()
    }
}

impl TryFrom<Vec<Vec<Term>>> for Layout {
    type Error = Error;

    fn try_from(rows: Vec<Vec<Term>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<Layout> for Vec<Vec<Term>> {
    fn from(layout: Layout) -> Self {
        layout.rows
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let mut terms = row.iter();
            if let Some(first) = terms.next() {
                write!(f, "{first}")?;
            }
            for term in terms {
                write!(f, " {term}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parses one row per line; `#` starts a comment and blank lines are skipped.
impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.split_whitespace().map(str::parse).collect())
            .collect::<Result<Vec<Vec<Term>>>>()?;

        Self::new(rows)
    }
}
