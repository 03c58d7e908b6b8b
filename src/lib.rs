//! # radigest
//!
//! 限制性内切酶体外模拟酶切（单酶 / 双酶），输出 GFF3 片段注释。
//!
//! 本 crate 提供：
//!
//! - **识别位点编译**：IUPAC 简并碱基 → 4 位掩码，`^` 标记切点
//! - **酶切方案**：单酶相邻切点成片段；双酶仅保留 AB / BA 相邻片段（可选 AA / BB）
//! - **有序收集**：多线程并行酶切，按输入顺序写出并汇总统计
//!
//! ## 快速示例
//!
//! ```rust
//! use radigest::digest::{DigestOptions, DigestPlan, Fragment, LengthRange};
//! use radigest::enzyme::EnzymeCatalog;
//!
//! let catalog = EnzymeCatalog::builtin();
//! let enzymes = catalog.resolve_list("EcoRI,MseI").unwrap();
//! let plan = DigestPlan::new(&enzymes, DigestOptions::default()).unwrap();
//!
//! let frags = plan.digest(b"AAAAGAATTCTTAAAGAATTC", LengthRange::unbounded());
//! assert_eq!(frags, vec![Fragment { start: 5, end: 11 }, Fragment { start: 11, end: 16 }]);
//! ```
//!
//! ## 模块说明
//!
//! - [`enzyme`] — 酶表、IUPAC 编码、位点匹配
//! - [`digest`] — 酶切方案与片段归并
//! - [`collect`] — 按序收集、GFF 写出、统计
//! - [`pipeline`] — 读入 / 工作线程池 / 收集线程
//! - [`io`] — FASTA 读取、GFF3 与 JSON 输出
//! - [`sim`] — 随机基因组模拟

pub mod collect;
pub mod digest;
pub mod enzyme;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod sim;

pub use error::DigestError;
