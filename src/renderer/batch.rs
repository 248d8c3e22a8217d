//! Sprite batching
//!
//! Draw requests accumulate on the host until the bound texture changes or
//! the instance buffer is full, then go out as one instanced draw. Batching
//! is sensitive to call order: only *adjacent* draws with the same texture
//! coalesce, so group draws by texture to keep the flush count low.

use super::instance::SpriteInstance;
use super::texture::TextureId;

/// Anything that can be bound for a batch
pub trait BatchTexture: Clone {
    fn id(&self) -> TextureId;

    /// False for textures that must never be drawn (e.g. zero-sized)
    fn is_drawable(&self) -> bool;
}

/// Receives one flushed batch
pub trait InstanceSink<T> {
    fn draw_instanced(&mut self, texture: &T, instances: &[SpriteInstance]);
}

impl<T, S: InstanceSink<T> + ?Sized> InstanceSink<T> for &mut S {
    fn draw_instanced(&mut self, texture: &T, instances: &[SpriteInstance]) {
        (**self).draw_instanced(texture, instances);
    }
}

/// Texture the pending batch is drawn with
#[derive(Debug, Clone)]
pub enum Binding<T> {
    Unbound,
    Bound(T),
}

impl<T: BatchTexture> Binding<T> {
    /// Binding `texture` requires flushing what is pending
    pub fn is_switch_to(&self, texture: &T) -> bool {
        match self {
            Binding::Unbound => true,
            Binding::Bound(bound) => bound.id() != texture.id(),
        }
    }

    pub fn texture(&self) -> Option<&T> {
        match self {
            Binding::Unbound => None,
            Binding::Bound(texture) => Some(texture),
        }
    }
}

/// Per-frame batching counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStats {
    /// Instanced draw calls issued
    pub flushes: u32,
    pub instances: u32,
}

#[derive(Debug)]
pub struct SpriteBatch<T> {
    pending: Vec<SpriteInstance>,
    binding: Binding<T>,
    max_instances: usize,
    stats: BatchStats,
}

impl<T: BatchTexture> SpriteBatch<T> {
    pub fn new(max_instances: usize) -> Self {
        let max_instances = max_instances.max(1);
        Self {
            pending: Vec::with_capacity(max_instances),
            binding: Binding::Unbound,
            max_instances,
            stats: BatchStats::default(),
        }
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn binding(&self) -> &Binding<T> {
        &self.binding
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Start a frame: nothing pending, nothing bound
    pub fn begin(&mut self) {
        self.pending.clear();
        self.binding = Binding::Unbound;
        self.stats = BatchStats::default();
    }

    /// Queue one sprite, flushing first if the texture changes or the batch is full
    pub fn push<S: InstanceSink<T>>(&mut self, sink: &mut S, texture: &T, instance: SpriteInstance) {
        if !texture.is_drawable() {
            return;
        }

        let switch = self.binding.is_switch_to(texture);
        if switch || self.pending.len() >= self.max_instances {
            self.flush(sink);
        }
        if switch {
            self.binding = Binding::Bound(texture.clone());
        }
        self.pending.push(instance);
    }

    /// Draw everything pending in one call. No-op when empty or unbound.
    pub fn flush<S: InstanceSink<T>>(&mut self, sink: &mut S) {
        if self.pending.is_empty() {
            return;
        }
        let Binding::Bound(texture) = &self.binding else {
            return;
        };

        sink.draw_instanced(texture, &self.pending);
        self.stats.flushes += 1;
        self.stats.instances += self.pending.len() as u32;
        self.pending.clear();
    }

    /// Flush the remainder and return the frame's counters
    pub fn end<S: InstanceSink<T>>(&mut self, sink: &mut S) -> BatchStats {
        self.flush(sink);
        self.binding = Binding::Unbound;
        self.stats
    }
}

/// One frame of batching bound to a sink. The remainder is flushed exactly
/// once, by `end` or else on drop, and the counters land in `last_stats`.
pub struct BatchPass<'a, T: BatchTexture, S: InstanceSink<T>> {
    batch: &'a mut SpriteBatch<T>,
    last_stats: &'a mut BatchStats,
    sink: S,
    ended: bool,
}

impl<'a, T: BatchTexture, S: InstanceSink<T>> BatchPass<'a, T, S> {
    pub fn begin(batch: &'a mut SpriteBatch<T>, last_stats: &'a mut BatchStats, sink: S) -> Self {
        batch.begin();
        Self {
            batch,
            last_stats,
            sink,
            ended: false,
        }
    }

    pub fn push(&mut self, texture: &T, instance: SpriteInstance) {
        self.batch.push(&mut self.sink, texture, instance);
    }

    /// Flush what is pending and return the frame's counters
    pub fn end(mut self) -> BatchStats {
        self.finish()
    }

    fn finish(&mut self) -> BatchStats {
        if !self.ended {
            self.ended = true;
            *self.last_stats = self.batch.end(&mut self.sink);
        }
        *self.last_stats
    }
}

impl<T: BatchTexture, S: InstanceSink<T>> Drop for BatchPass<'_, T, S> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct FakeTexture {
        pub id: u32,
        pub size: u32,
    }

    impl FakeTexture {
        pub fn new(id: u32) -> Self {
            Self { id, size: 16 }
        }
    }

    impl BatchTexture for FakeTexture {
        fn id(&self) -> TextureId {
            TextureId(self.id)
        }

        fn is_drawable(&self) -> bool {
            self.size > 0
        }
    }

    /// Records every flush as (texture id, instance count)
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub draws: Vec<(u32, usize)>,
        pub instances: Vec<SpriteInstance>,
    }

    impl InstanceSink<FakeTexture> for RecordingSink {
        fn draw_instanced(&mut self, texture: &FakeTexture, instances: &[SpriteInstance]) {
            self.draws.push((texture.id, instances.len()));
            self.instances.extend_from_slice(instances);
        }
    }

    fn sprite(x: f32) -> SpriteInstance {
        SpriteInstance {
            position: [x, 0.0],
            scale: [1.0, 1.0],
            rotation: 0.0,
            uv: Default::default(),
            color: SpriteInstance::WHITE,
        }
    }

    #[test]
    fn test_same_texture_flushes_once_at_end() {
        let tex = FakeTexture::new(1);
        let mut batch = SpriteBatch::new(1000);
        let mut sink = RecordingSink::default();
        batch.begin();
        for i in 0..1000 {
            batch.push(&mut sink, &tex, sprite(i as f32));
        }
        assert!(sink.draws.is_empty());
        let stats = batch.end(&mut sink);
        assert_eq!(sink.draws, vec![(1, 1000)]);
        assert_eq!(stats, BatchStats { flushes: 1, instances: 1000 });
    }

    #[test]
    fn test_alternating_textures_flush_every_draw() {
        let a = FakeTexture::new(1);
        let b = FakeTexture::new(2);
        let mut batch = SpriteBatch::new(64);
        let mut sink = RecordingSink::default();
        batch.begin();
        for i in 0..10 {
            let tex = if i % 2 == 0 { &a } else { &b };
            batch.push(&mut sink, tex, sprite(i as f32));
        }
        let stats = batch.end(&mut sink);
        assert_eq!(stats.flushes, 10);
        assert!(sink.draws.iter().all(|&(_, n)| n == 1));
        assert_eq!(sink.draws[0].0, 1);
        assert_eq!(sink.draws[1].0, 2);
    }

    #[test]
    fn test_full_batch_flushes_before_append() {
        let tex = FakeTexture::new(7);
        let mut batch = SpriteBatch::new(4);
        let mut sink = RecordingSink::default();
        batch.begin();
        for i in 0..10 {
            batch.push(&mut sink, &tex, sprite(i as f32));
            assert!(batch.pending() <= 4);
        }
        batch.end(&mut sink);
        assert_eq!(sink.draws, vec![(7, 4), (7, 4), (7, 2)]);
    }

    #[test]
    fn test_invalid_texture_is_ignored() {
        let good = FakeTexture::new(1);
        let broken = FakeTexture { id: 2, size: 0 };
        let mut batch = SpriteBatch::new(16);
        let mut sink = RecordingSink::default();
        batch.begin();
        batch.push(&mut sink, &good, sprite(0.0));
        batch.push(&mut sink, &broken, sprite(1.0));
        batch.push(&mut sink, &good, sprite(2.0));
        batch.end(&mut sink);
        // The broken draw neither flushed nor rebound the batch
        assert_eq!(sink.draws, vec![(1, 2)]);
    }

    #[test]
    fn test_flush_without_binding_is_noop() {
        let mut batch: SpriteBatch<FakeTexture> = SpriteBatch::new(16);
        let mut sink = RecordingSink::default();
        batch.begin();
        batch.flush(&mut sink);
        assert_eq!(batch.end(&mut sink), BatchStats::default());
        assert!(sink.draws.is_empty());
        assert!(batch.binding().texture().is_none());
    }

    #[test]
    fn test_begin_discards_leftovers() {
        let tex = FakeTexture::new(1);
        let mut batch = SpriteBatch::new(16);
        let mut sink = RecordingSink::default();
        batch.begin();
        batch.push(&mut sink, &tex, sprite(0.0));
        batch.begin();
        assert_eq!(batch.pending(), 0);
        assert!(matches!(batch.binding(), Binding::Unbound));
        batch.end(&mut sink);
        assert!(sink.draws.is_empty());
    }

    /// Counts flushes only
    #[derive(Debug, Default)]
    struct CountingSink {
        flushes: u32,
    }

    impl InstanceSink<FakeTexture> for CountingSink {
        fn draw_instanced(&mut self, _texture: &FakeTexture, _instances: &[SpriteInstance]) {
            self.flushes += 1;
        }
    }

    #[test]
    fn test_pass_end_flushes_once() {
        let tex = FakeTexture::new(4);
        let mut batch = SpriteBatch::new(16);
        let mut last = BatchStats::default();
        let mut sink = CountingSink::default();

        let mut pass = BatchPass::begin(&mut batch, &mut last, &mut sink);
        pass.push(&tex, sprite(0.0));
        pass.push(&tex, sprite(1.0));
        let stats = pass.end();

        assert_eq!(stats, BatchStats { flushes: 1, instances: 2 });
        assert_eq!(last, stats);
        assert_eq!(sink.flushes, 1);
        // The pass closed the batch
        assert_eq!(batch.pending(), 0);
        assert!(batch.binding().texture().is_none());
    }

    #[test]
    fn test_dropped_pass_flushes_remainder() {
        let tex = FakeTexture::new(2);
        let mut batch = SpriteBatch::new(16);
        let mut last = BatchStats::default();
        let mut sink = RecordingSink::default();
        {
            let mut pass = BatchPass::begin(&mut batch, &mut last, &mut sink);
            for i in 0..3 {
                pass.push(&tex, sprite(i as f32));
            }
        }
        assert_eq!(sink.draws, vec![(2, 3)]);
        assert_eq!(last, BatchStats { flushes: 1, instances: 3 });
    }

    proptest! {
        #[test]
        fn prop_draw_order_and_count_preserved(
            textures in prop::collection::vec(0u32..3, 0..200),
            max in 1usize..32,
        ) {
            let mut batch = SpriteBatch::new(max);
            let mut sink = RecordingSink::default();
            batch.begin();
            for (i, &id) in textures.iter().enumerate() {
                batch.push(&mut sink, &FakeTexture::new(id), sprite(i as f32));
            }
            let stats = batch.end(&mut sink);

            prop_assert_eq!(stats.instances as usize, textures.len());
            prop_assert_eq!(stats.flushes as usize, sink.draws.len());
            prop_assert!(sink.draws.iter().all(|&(_, n)| n >= 1 && n <= max));

            // Instances arrive in submission order with the right texture
            let flat: Vec<u32> = sink
                .draws
                .iter()
                .flat_map(|&(id, n)| std::iter::repeat_n(id, n))
                .collect();
            prop_assert_eq!(&flat, &textures);
            for (i, inst) in sink.instances.iter().enumerate() {
                prop_assert_eq!(inst.position[0], i as f32);
            }
        }
    }
}
