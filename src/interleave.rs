use crate::collection::SampleSource;
use crate::error::CollectionError;
use crate::types::LabeledSample;

/// Duration-ordered k-way merge over several sample sources.
///
/// Every source must already be ascending by the merge key; the merge then
/// emits the globally smallest head at each step, advancing only the source
/// it came from. Ties go to the earlier-listed source, which keeps the output
/// deterministic. A source that violates its own ordering degrades the output
/// ordering from that point on; sources are not validated here.
#[derive(Debug)]
pub struct Interleaved<S> {
    sources: Vec<S>,
}

impl<S: SampleSource> Interleaved<S> {
    pub fn new(sources: Vec<S>) -> Self {
        Self { sources }
    }

    /// Total sample count across all sources.
    pub fn len(&self) -> usize {
        self.sources.iter().map(S::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.iter().all(S::is_empty)
    }

    /// Merged sequence keyed on estimated duration. Call again to restart.
    pub fn iter(&mut self) -> InterleavedIter<'_, S, fn(&LabeledSample) -> f64> {
        let duration_key: fn(&LabeledSample) -> f64 = |sample| sample.duration_secs;
        self.iter_by_key(duration_key)
    }

    /// Merged sequence under a caller-supplied ordering key.
    pub fn iter_by_key<F>(&mut self, key: F) -> InterleavedIter<'_, S, F>
    where
        F: Fn(&LabeledSample) -> f64,
    {
        InterleavedIter {
            cursors: self
                .sources
                .iter_mut()
                .map(|source| Cursor {
                    len: source.len(),
                    source,
                    next_index: 0,
                    head: None,
                })
                .collect(),
            key,
        }
    }
}

struct Cursor<'a, S> {
    source: &'a mut S,
    len: usize,
    next_index: usize,
    head: Option<LabeledSample>,
}

pub struct InterleavedIter<'a, S, F> {
    cursors: Vec<Cursor<'a, S>>,
    key: F,
}

impl<S, F> Iterator for InterleavedIter<'_, S, F>
where
    S: SampleSource,
    F: Fn(&LabeledSample) -> f64,
{
    type Item = Result<LabeledSample, CollectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Refill exhausted heads lazily; a failed fetch surfaces in-stream
        // and the merge resumes with that source's next sample.
        for cursor in &mut self.cursors {
            if cursor.head.is_none() && cursor.next_index < cursor.len {
                let fetched = cursor.source.get(cursor.next_index);
                cursor.next_index += 1;
                match fetched {
                    Ok(sample) => cursor.head = Some(sample),
                    Err(err) => return Some(Err(err)),
                }
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for (source_index, cursor) in self.cursors.iter().enumerate() {
            let Some(head) = cursor.head.as_ref() else {
                continue;
            };
            let head_key = (self.key)(head);
            // Strict comparison keeps the first listed source on ties.
            let better = match best {
                None => true,
                Some((_, best_key)) => head_key < best_key,
            };
            if better {
                best = Some((source_index, head_key));
            }
        }
        let (winner, _) = best?;
        self.cursors[winner].head.take().map(Ok)
    }
}
