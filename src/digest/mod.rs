use crate::enzyme::{CompiledMatcher, CutSource, Enzyme};
use crate::error::DigestError;

/// 酶切片段，0-based 半开区间 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
}

impl Fragment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 片段长度过滤区间（两端均包含）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    min: usize,
    max: usize,
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Result<Self, DigestError> {
        if min > max {
            return Err(DigestError::InvalidLengthRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// [0, ∞)
    pub fn unbounded() -> Self {
        Self { min: 0, max: usize::MAX }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    #[inline]
    pub fn contains(&self, len: usize) -> bool {
        self.min <= len && len <= self.max
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestOptions {
    /// 双酶切时同时保留 AA / BB 相邻片段
    pub allow_same_adjacency: bool,
    /// 酶缺少切点标记且 cut_index 为 0 时报错，而不是取位点中点
    pub strict_cut_validation: bool,
}

/// 单酶 / 双酶模式在构建时确定
#[derive(Debug, Clone)]
enum Matchers {
    None,
    Single(CompiledMatcher),
    Double(CompiledMatcher, CompiledMatcher),
}

/// 酶切位点缓冲区，可跨调用复用
#[derive(Debug, Default)]
pub struct CutBuffer {
    a: Vec<usize>,
    b: Vec<usize>,
}

impl CutBuffer {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            a: Vec::with_capacity(cap),
            b: Vec::with_capacity(cap),
        }
    }

    fn clear(&mut self) {
        self.a.clear();
        self.b.clear();
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tag {
    A,
    B,
}

/// 预编译的酶切方案：一次构建，多条序列复用，可在线程间只读共享
#[derive(Debug, Clone)]
pub struct DigestPlan {
    matchers: Matchers,
    options: DigestOptions,
}

impl DigestPlan {
    /// 使用前两个酶构建方案（A 必选，B 可选）。
    ///
    /// 两个酶是否相同由调用方检查（见 [`crate::enzyme::validate_pair`]）。
    pub fn new(enzymes: &[Enzyme], options: DigestOptions) -> Result<Self, DigestError> {
        let compile = |e: &Enzyme| -> Result<CompiledMatcher, DigestError> {
            let (m, source) = CompiledMatcher::compile(e)?;
            if options.strict_cut_validation && source == CutSource::Midpoint {
                return Err(DigestError::StrictValidationFailed { enzyme: e.name.clone() });
            }
            Ok(m)
        };
        let matchers = match enzymes {
            [] => Matchers::None,
            [a] => Matchers::Single(compile(a)?),
            [a, b, ..] => Matchers::Double(compile(a)?, compile(b)?),
        };
        Ok(Self { matchers, options })
    }

    pub fn digest(&self, seq: &[u8], range: LengthRange) -> Vec<Fragment> {
        self.digest_with_buf(seq, range, &mut CutBuffer::new())
    }

    pub fn digest_with_buf(&self, seq: &[u8], range: LengthRange, buf: &mut CutBuffer) -> Vec<Fragment> {
        buf.clear();
        match &self.matchers {
            Matchers::None => Vec::new(),
            Matchers::Single(a) => {
                a.scan_into(seq, &mut buf.a);
                single_fragments(&buf.a, range)
            }
            Matchers::Double(a, b) => {
                a.scan_into(seq, &mut buf.a);
                b.scan_into(seq, &mut buf.b);
                merge_fragments(&buf.a, &buf.b, range, self.options.allow_same_adjacency)
            }
        }
    }
}

/// 单酶：相邻切点两两成片段
fn single_fragments(cuts: &[usize], range: LengthRange) -> Vec<Fragment> {
    cuts.windows(2)
        .map(|w| Fragment { start: w[0], end: w[1] })
        .filter(|f| range.contains(f.len()))
        .collect()
}

/// 双酶：按位置归并 A / B 切点。
///
/// 两酶同位切割时输出零长片段并清空前驱，不跨越该位置拼接片段。
fn merge_fragments(a: &[usize], b: &[usize], range: LengthRange, allow_same: bool) -> Vec<Fragment> {
    let mut out = Vec::with_capacity((a.len() + b.len()) / 2);
    let (mut i, mut j) = (0, 0);
    let mut prev: Option<(usize, Tag)> = None;

    while i < a.len() || j < b.len() {
        let pos = match (a.get(i), b.get(j)) {
            (Some(&pa), Some(&pb)) => pa.min(pb),
            (Some(&pa), None) => pa,
            (None, Some(&pb)) => pb,
            (None, None) => break,
        };
        let has_a = a.get(i) == Some(&pos);
        let has_b = b.get(j) == Some(&pos);

        if has_a && has_b {
            if range.contains(0) {
                out.push(Fragment { start: pos, end: pos });
            }
            i += 1;
            j += 1;
            prev = None;
            continue;
        }

        let tag = if has_a {
            i += 1;
            Tag::A
        } else {
            j += 1;
            Tag::B
        };

        if let Some((prev_pos, prev_tag)) = prev {
            if (allow_same || prev_tag != tag) && range.contains(pos - prev_pos) {
                out.push(Fragment { start: prev_pos, end: pos });
            }
        }
        prev = Some((pos, tag));
    }
    out
}
