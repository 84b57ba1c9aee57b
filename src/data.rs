//! Storage for categorical datasets.
//!
//! A [`DataMatrix`] holds `n` variables observed over `m` samples. Each observation is a small
//! signed integer, a [`Symbol`]: non-negative symbols are bins in `[0, bins)`, and negative symbols
//! mark observations that are missing.

use crate::{Error, Result, Symbol};
use csv_core::{ReadFieldResult, ReaderBuilder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::str;

/// The largest number of bins a matrix can declare; every bin has to be a non-negative [`Symbol`].
pub const MAX_BINS: usize = i8::MAX as usize + 1;

/// How the symbols of a [`DataMatrix`] are laid out in memory, and how its files are laid out on
/// disk.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    /// Variable-major: all samples of one variable are contiguous, and a file holds one variable
    /// per line.
    RowMajor,
    /// Sample-major: all variables of one sample are contiguous, and a file holds one sample per
    /// line.
    ColumnMajor,
}

/// The element type of a caller-supplied buffer, along with the elements themselves.
#[derive(Clone, Copy, Debug)]
pub enum Elements<'a> {
    /// Signed bytes, the only type a [`DataMatrix`] can borrow.
    I8(&'a [i8]),
    /// Unsigned bytes.
    U8(&'a [u8]),
    /// 16-bit integers.
    I16(&'a [i16]),
    /// 32-bit integers.
    I32(&'a [i32]),
    /// 64-bit integers.
    I64(&'a [i64]),
}

impl Elements<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            Elements::I8(_) => "i8",
            Elements::U8(_) => "u8",
            Elements::I16(_) => "i16",
            Elements::I32(_) => "i32",
            Elements::I64(_) => "i64",
        }
    }
}

/// Physical memory layout of a two-dimensional buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    /// The last axis is contiguous, so with a `(variables, samples)` shape each variable is
    /// contiguous.
    C,
    /// The first axis is contiguous, so with a `(variables, samples)` shape each sample is
    /// contiguous.
    Fortran,
}

/// A two-dimensional buffer owned by someone else, described well enough to borrow it safely.
#[derive(Clone, Copy, Debug)]
pub struct Buffer<'a> {
    /// The elements and their type.
    pub elements: Elements<'a>,
    /// Logical shape as `(variables, samples)`.
    pub shape: (usize, usize),
    /// Which axis is contiguous in memory.
    pub layout: Layout,
}

/// An `n × m` matrix of categorical observations.
///
/// The symbols may be owned by the matrix or borrowed from a caller's buffer (see
/// [`DataMatrix::from_buffer`]); either way the matrix is read-only while a search uses it.
#[derive(Clone)]
pub struct DataMatrix<'a> {
    symbols: Cow<'a, [Symbol]>,
    nvars: usize,
    nsamples: usize,
    bins: usize,
    order: Order,
    delimiter: u8,
}

impl fmt::Debug for DataMatrix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataMatrix")
            .field("nvars", &self.nvars)
            .field("nsamples", &self.nsamples)
            .field("bins", &self.bins)
            .field("order", &self.order)
            .finish()
    }
}

fn check_dimensions(nvars: usize, nsamples: usize) -> Result<usize> {
    if nvars == 0 || nsamples == 0 {
        return Err(Error::config(format!(
            "a data matrix needs at least one variable and one sample, not {}x{}",
            nvars, nsamples
        )));
    }
    nvars
        .checked_mul(nsamples)
        .ok_or_else(|| Error::config(format!("{}x{} matrix is too large", nvars, nsamples)))
}

fn check_bins(bins: usize) -> Result<()> {
    if bins == 0 || bins > MAX_BINS {
        return Err(Error::config(format!(
            "bin count must be between 1 and {}, not {}",
            MAX_BINS, bins
        )));
    }
    Ok(())
}

/// The bin count implied by the largest observed symbol.
fn inferred_bins(symbols: &[Symbol]) -> usize {
    symbols.iter().copied().max().map_or(1, |max| (max.max(0) as usize) + 1)
}

impl DataMatrix<'static> {
    /// Creates a row-major matrix of symbols drawn uniformly from `[0, bins)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any dimension is zero or `bins` exceeds [`MAX_BINS`].
    pub fn random(nvars: usize, nsamples: usize, bins: usize) -> Result<Self> {
        Self::random_with(&mut rand::thread_rng(), nvars, nsamples, bins)
    }

    /// Like [`DataMatrix::random`], but reproducible: the same seed always produces the same
    /// matrix.
    ///
    /// ```
    /// use mist::DataMatrix;
    ///
    /// let a = DataMatrix::random_seeded(3, 20, 4, 7).unwrap();
    /// let b = DataMatrix::random_seeded(3, 20, 4, 7).unwrap();
    /// assert_eq!(a.as_slice(), b.as_slice());
    /// assert!(a.as_slice().iter().all(|&s| (0..4).contains(&s)));
    /// ```
    pub fn random_seeded(nvars: usize, nsamples: usize, bins: usize, seed: u64) -> Result<Self> {
        Self::random_with(&mut ChaCha8Rng::seed_from_u64(seed), nvars, nsamples, bins)
    }

    fn random_with<R: Rng>(rng: &mut R, nvars: usize, nsamples: usize, bins: usize) -> Result<Self> {
        let len = check_dimensions(nvars, nsamples)?;
        check_bins(bins)?;
        let symbols = (0..len)
            .map(|_| rng.gen_range(0..bins) as Symbol)
            .collect();
        Ok(DataMatrix {
            symbols: Cow::Owned(symbols),
            nvars,
            nsamples,
            bins,
            order: Order::RowMajor,
            delimiter: b',',
        })
    }

    /// Takes ownership of `symbols`, laid out in the given `order`, and infers the bin count from
    /// the largest symbol.
    ///
    /// ```
    /// use mist::{DataMatrix, Order};
    ///
    /// let data = DataMatrix::from_vec(vec![0, 1, 2, 1, 0, 0], 2, 3, Order::RowMajor).unwrap();
    /// assert_eq!(data.bins(), 3);
    /// assert_eq!(data.variable(1).iter().collect::<Vec<_>>(), [1, 0, 0]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a dimension is zero, and [`Error::Layout`] if the number of
    /// symbols is not `nvars * nsamples`.
    pub fn from_vec(
        symbols: Vec<Symbol>,
        nvars: usize,
        nsamples: usize,
        order: Order,
    ) -> Result<Self> {
        let len = check_dimensions(nvars, nsamples)?;
        if symbols.len() != len {
            return Err(Error::layout(format!(
                "{} symbols cannot form a {}x{} matrix",
                symbols.len(),
                nvars,
                nsamples
            )));
        }
        let bins = inferred_bins(&symbols);
        Ok(DataMatrix {
            symbols: Cow::Owned(symbols),
            nvars,
            nsamples,
            bins,
            order,
            delimiter: b',',
        })
    }

    /// Loads a matrix from a delimited file; see [`DataMatrix::from_reader`].
    pub fn from_file<P: AsRef<Path>>(path: P, order: Order) -> Result<Self> {
        Self::from_reader(File::open(path)?, order)
    }

    /// Parses a rectangular table of integers separated by commas or tabs, whichever appears on
    /// the first line. With [`Order::RowMajor`] each line is a variable; with
    /// [`Order::ColumnMajor`] each line is a sample.
    ///
    /// ```
    /// use mist::{DataMatrix, Order};
    ///
    /// let data = DataMatrix::from_reader(&b"0\t1\t1\n2\t0\t-1\n"[..], Order::RowMajor).unwrap();
    /// assert_eq!((data.nvars(), data.nsamples(), data.bins()), (2, 3, 3));
    ///
    /// let err = DataMatrix::from_reader(&b"0,1\n2\n"[..], Order::RowMajor).unwrap_err();
    /// assert!(matches!(err, mist::Error::Format { line: 2, .. }));
    /// ```
    pub fn from_reader<I: io::Read>(mut input: I, order: Order) -> Result<Self> {
        let mut inputbuf = [0; 16384];

        // readers may hand over the first line in pieces
        let mut head = Vec::new();
        let delimiter = loop {
            if let Some(delimiter) = detect_delimiter(&head) {
                break delimiter;
            }
            let read = input.read(&mut inputbuf)?;
            head.extend_from_slice(&inputbuf[..read]);
            if read == 0 || head.contains(&b'\n') {
                break detect_delimiter(&head).unwrap_or(b',');
            }
        };
        let mut input = io::Cursor::new(head).chain(input);
        let mut csv = ReaderBuilder::new().delimiter(delimiter).build();

        let mut fieldbuf = [0; 64];
        let mut fieldlen = 0;
        let mut symbols = Vec::new();
        let mut record_len = 0;
        let mut row_len = None;
        let mut rows = 0;

        loop {
            let read = input.read(&mut inputbuf)?;
            let mut bytes = &inputbuf[..read];
            loop {
                let (result, nin, nout) = csv.read_field(bytes, &mut fieldbuf[fieldlen..]);
                bytes = &bytes[nin..];
                fieldlen += nout;
                match result {
                    ReadFieldResult::InputEmpty => break,
                    ReadFieldResult::OutputFull => {
                        return Err(Error::format(csv.line(), "field too long"));
                    }
                    ReadFieldResult::Field { record_end } => {
                        let field = &fieldbuf[..fieldlen];
                        fieldlen = 0;

                        // blank line
                        if record_end && record_len == 0 && field.is_empty() {
                            continue;
                        }

                        // csv_core has already counted the newline ending this record
                        let line = if record_end && read > 0 {
                            csv.line() - 1
                        } else {
                            csv.line()
                        };
                        symbols.push(parse_symbol(field, line)?);
                        record_len += 1;

                        if record_end {
                            match row_len {
                                None => row_len = Some(record_len),
                                Some(expected) if expected != record_len => {
                                    return Err(Error::format(
                                        line,
                                        format!(
                                            "expected {} fields, found {}",
                                            expected, record_len
                                        ),
                                    ));
                                }
                                Some(_) => {}
                            }
                            rows += 1;
                            record_len = 0;
                        }
                    }
                    ReadFieldResult::End => {
                        let row_len = match row_len {
                            Some(len) => len,
                            None => return Err(Error::format(csv.line(), "no data")),
                        };
                        let (nvars, nsamples) = match order {
                            Order::RowMajor => (rows, row_len),
                            Order::ColumnMajor => (row_len, rows),
                        };
                        let bins = inferred_bins(&symbols);
                        return Ok(DataMatrix {
                            symbols: Cow::Owned(symbols),
                            nvars,
                            nsamples,
                            bins,
                            order,
                            delimiter,
                        });
                    }
                }
            }
        }
    }
}

/// The first comma or tab on the first line, if `head` has one.
fn detect_delimiter(head: &[u8]) -> Option<u8> {
    head.iter()
        .take_while(|&&b| b != b'\n')
        .find(|&&b| b == b',' || b == b'\t')
        .copied()
}

fn parse_symbol(field: &[u8], line: u64) -> Result<Symbol> {
    let text = str::from_utf8(field)
        .map_err(|_| Error::format(line, "field is not valid UTF-8"))?
        .trim();
    if text.is_empty() {
        return Err(Error::format(line, "empty field"));
    }
    let value: i64 = text
        .parse()
        .map_err(|_| Error::format(line, format!("{:?} is not an integer", text)))?;
    Symbol::try_from(value)
        .map_err(|_| Error::format(line, format!("{} does not fit in a symbol", value)))
}

impl<'a> DataMatrix<'a> {
    /// Wraps a caller's buffer without copying or scanning it.
    ///
    /// The buffer must hold `i8` elements, its element count must match its shape, and its
    /// physical layout must already be the requested `order`: [`Layout::C`] for
    /// [`Order::RowMajor`] and [`Layout::Fortran`] for [`Order::ColumnMajor`]. Since nothing is
    /// scanned, `bins` is trusted; the estimators report symbols outside it as
    /// [`Error::Domain`].
    ///
    /// ```
    /// use mist::data::{Buffer, Elements, Layout};
    /// use mist::{DataMatrix, Order};
    ///
    /// let raw = [0i8, 1, 1, 0, 1, 1];
    /// let buffer = Buffer { elements: Elements::I8(&raw), shape: (2, 3), layout: Layout::C };
    /// let data = DataMatrix::from_buffer(buffer, Order::RowMajor, 2).unwrap();
    /// assert_eq!(data.as_slice().as_ptr(), raw.as_ptr());
    ///
    /// let wide = [0i32; 6];
    /// let buffer = Buffer { elements: Elements::I32(&wide), shape: (2, 3), layout: Layout::C };
    /// assert!(matches!(
    ///     DataMatrix::from_buffer(buffer, Order::RowMajor, 2),
    ///     Err(mist::Error::Type { .. })
    /// ));
    /// ```
    pub fn from_buffer(buffer: Buffer<'a>, order: Order, bins: usize) -> Result<Self> {
        let symbols = match buffer.elements {
            Elements::I8(symbols) => symbols,
            other => {
                return Err(Error::Type {
                    expected: "i8",
                    found: other.type_name(),
                })
            }
        };
        let (nvars, nsamples) = buffer.shape;
        let len = check_dimensions(nvars, nsamples)?;
        check_bins(bins)?;
        if symbols.len() != len {
            return Err(Error::layout(format!(
                "buffer holds {} elements but its shape is {}x{}",
                symbols.len(),
                nvars,
                nsamples
            )));
        }
        match (order, buffer.layout) {
            (Order::RowMajor, Layout::C) | (Order::ColumnMajor, Layout::Fortran) => {}
            (order, layout) => {
                return Err(Error::layout(format!(
                    "{:?} storage cannot borrow a {:?}-contiguous buffer",
                    order, layout
                )))
            }
        }
        Ok(DataMatrix {
            symbols: Cow::Borrowed(symbols),
            nvars,
            nsamples,
            bins,
            order,
            delimiter: b',',
        })
    }

    /// The number of variables, `n`.
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    /// The number of samples, `m`.
    pub fn nsamples(&self) -> usize {
        self.nsamples
    }

    /// The number of bins; every non-missing symbol should be less than this.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// How the symbols are laid out.
    pub fn order(&self) -> Order {
        self.order
    }

    /// The raw symbols in storage order.
    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    /// A view of one variable's observations across every sample.
    ///
    /// # Panics
    ///
    /// Panics if `variable` is not less than [`DataMatrix::nvars`].
    pub fn variable(&self, variable: usize) -> VariableView<'_> {
        assert!(variable < self.nvars, "variable {} out of range", variable);
        let (offset, stride) = match self.order {
            Order::RowMajor => (variable * self.nsamples, 1),
            Order::ColumnMajor => (variable, self.nvars),
        };
        VariableView {
            symbols: &self.symbols,
            offset,
            stride,
            len: self.nsamples,
        }
    }

    /// Copies the matrix into the given storage order.
    pub fn to_order(&self, order: Order) -> DataMatrix<'static> {
        let symbols = if order == self.order {
            self.symbols.to_vec()
        } else {
            let mut symbols = Vec::with_capacity(self.symbols.len());
            match order {
                Order::RowMajor => {
                    for v in 0..self.nvars {
                        symbols.extend(self.variable(v).iter());
                    }
                }
                Order::ColumnMajor => {
                    let views: Vec<_> = (0..self.nvars).map(|v| self.variable(v)).collect();
                    for s in 0..self.nsamples {
                        symbols.extend(views.iter().map(|view| view.get(s)));
                    }
                }
            }
            symbols
        };
        DataMatrix {
            symbols: Cow::Owned(symbols),
            nvars: self.nvars,
            nsamples: self.nsamples,
            bins: self.bins,
            order,
            delimiter: self.delimiter,
        }
    }

    /// Appends the samples of `block` to this matrix, copying borrowed storage first if needed.
    /// The bin count grows to cover both.
    ///
    /// ```
    /// use mist::{DataMatrix, Order};
    ///
    /// let mut data = DataMatrix::from_vec(vec![0, 1, 1, 0], 2, 2, Order::ColumnMajor).unwrap();
    /// let block = DataMatrix::from_vec(vec![2, 2], 2, 1, Order::ColumnMajor).unwrap();
    /// data.append_samples(&block).unwrap();
    /// assert_eq!(data.nsamples(), 3);
    /// assert_eq!(data.bins(), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Layout`] unless both matrices are [`Order::ColumnMajor`], where samples
    /// are contiguous, and [`Error::Config`] if they have different numbers of variables.
    pub fn append_samples(&mut self, block: &DataMatrix<'_>) -> Result<()> {
        if self.order != Order::ColumnMajor || block.order != Order::ColumnMajor {
            return Err(Error::layout(
                "samples can only be appended between column-major matrices",
            ));
        }
        if block.nvars != self.nvars {
            return Err(Error::config(format!(
                "cannot append samples of {} variables to a matrix of {}",
                block.nvars, self.nvars
            )));
        }
        self.symbols.to_mut().extend_from_slice(&block.symbols);
        self.nsamples += block.nsamples;
        self.bins = self.bins.max(block.bins);
        Ok(())
    }

    /// Writes the matrix to a file; see [`DataMatrix::write_to`].
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Writes one line per storage row (a variable when row-major, a sample when column-major),
    /// using the delimiter the matrix was read with.
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        let row_len = match self.order {
            Order::RowMajor => self.nsamples,
            Order::ColumnMajor => self.nvars,
        };
        for row in self.symbols.chunks(row_len) {
            for (i, symbol) in row.iter().enumerate() {
                if i > 0 {
                    out.write_all(&[self.delimiter])?;
                }
                write!(out, "{}", symbol)?;
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// One variable's observations, in sample order, regardless of the matrix's storage order.
#[derive(Clone, Copy, Debug)]
pub struct VariableView<'m> {
    symbols: &'m [Symbol],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'m> VariableView<'m> {
    /// The number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no samples; never true for a view of a valid matrix.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The observation at `sample`.
    ///
    /// # Panics
    ///
    /// Panics if `sample` is out of range.
    pub fn get(&self, sample: usize) -> Symbol {
        assert!(sample < self.len);
        self.symbols[self.offset + sample * self.stride]
    }

    /// Iterates over the observations in sample order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + 'm {
        let symbols = self.symbols;
        symbols[self.offset..]
            .iter()
            .step_by(self.stride)
            .take(self.len)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_agree_across_orders() {
        let data = DataMatrix::random_seeded(4, 25, 3, 1).unwrap();
        let transposed = data.to_order(Order::ColumnMajor);
        assert_eq!(transposed.order(), Order::ColumnMajor);
        for v in 0..4 {
            let a: Vec<_> = data.variable(v).iter().collect();
            let b: Vec<_> = transposed.variable(v).iter().collect();
            assert_eq!(a, b);
            assert_eq!(a.len(), 25);
        }
        let back = transposed.to_order(Order::RowMajor);
        assert_eq!(back.as_slice(), data.as_slice());
    }

    #[test]
    fn random_rejects_bad_dimensions() {
        assert!(matches!(DataMatrix::random(0, 5, 2), Err(Error::Config(_))));
        assert!(matches!(DataMatrix::random(5, 0, 2), Err(Error::Config(_))));
        assert!(matches!(DataMatrix::random(5, 5, 0), Err(Error::Config(_))));
        assert!(matches!(DataMatrix::random(5, 5, 129), Err(Error::Config(_))));
        assert!(DataMatrix::random(5, 5, 128).is_ok());
    }

    #[test]
    fn parse_errors_report_lines() {
        let err = DataMatrix::from_reader(&b"1,2\n3,x\n"[..], Order::RowMajor).unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }), "{:?}", err);

        let err = DataMatrix::from_reader(&b"1,2\n3,\n"[..], Order::RowMajor).unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }), "{:?}", err);

        let err = DataMatrix::from_reader(&b"1,200\n"[..], Order::RowMajor).unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }), "{:?}", err);

        let err = DataMatrix::from_reader(&b""[..], Order::RowMajor).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{:?}", err);
    }

    /// Hands over one byte per read, like a slow pipe.
    struct Trickle<'a>(&'a [u8]);

    impl std::io::Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((&byte, rest)), Some(out)) => {
                    *out = byte;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn delimiter_survives_short_reads() {
        let input = b"0\t1\t1\n2\t0\t-1\n";
        let data = DataMatrix::from_reader(Trickle(input), Order::RowMajor).unwrap();
        let whole = DataMatrix::from_reader(&input[..], Order::RowMajor).unwrap();
        assert_eq!((data.nvars(), data.nsamples()), (2, 3));
        assert_eq!(data.as_slice(), whole.as_slice());

        let mut out = Vec::new();
        data.write_to(&mut out).unwrap();
        assert_eq!(out, input);

        let err = DataMatrix::from_reader(Trickle(b"0,1,2\n1,2\n"), Order::RowMajor).unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }), "{:?}", err);
    }

    #[test]
    fn column_major_files_hold_samples() {
        let data = DataMatrix::from_reader(&b"0,1,2\n1,1,0\n"[..], Order::ColumnMajor).unwrap();
        assert_eq!(data.nvars(), 3);
        assert_eq!(data.nsamples(), 2);
        assert_eq!(data.variable(2).iter().collect::<Vec<_>>(), [2, 0]);
    }

    #[test]
    fn missing_values_do_not_raise_bins() {
        let data = DataMatrix::from_vec(vec![-1, -1, 0, 1], 2, 2, Order::RowMajor).unwrap();
        assert_eq!(data.bins(), 2);
        let data = DataMatrix::from_vec(vec![-1, -1], 1, 2, Order::RowMajor).unwrap();
        assert_eq!(data.bins(), 1);
    }

    #[test]
    fn append_requires_column_major() {
        let mut data = DataMatrix::from_vec(vec![0, 1], 1, 2, Order::RowMajor).unwrap();
        let block = DataMatrix::from_vec(vec![1], 1, 1, Order::ColumnMajor).unwrap();
        assert!(matches!(data.append_samples(&block), Err(Error::Layout(_))));

        let mut data = data.to_order(Order::ColumnMajor);
        let wide = DataMatrix::from_vec(vec![1, 1], 2, 1, Order::ColumnMajor).unwrap();
        assert!(matches!(data.append_samples(&wide), Err(Error::Config(_))));
        data.append_samples(&block).unwrap();
        assert_eq!(data.variable(0).iter().collect::<Vec<_>>(), [0, 1, 1]);
    }
}
