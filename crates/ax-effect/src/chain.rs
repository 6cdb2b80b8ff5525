use ax_core::CoreError;
use ax_core::frame::FrameBuffer;
use ax_core::traits::PostPass;

/// Chaîne ordonnée de passes, exécutée en ping-pong entre deux buffers.
///
/// # Example
/// ```
/// use ax_effect::PassChain;
/// use ax_core::frame::FrameBuffer;
/// let chain = PassChain::new();
/// let input = FrameBuffer::filled(4, 4, [1, 2, 3, 4]);
/// assert_eq!(chain.run(&input).unwrap(), input);
/// ```
#[derive(Default)]
pub struct PassChain {
    passes: Vec<Box<dyn PostPass>>,
}

impl PassChain {
    /// Empty chain; running it returns a copy of the input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass at the end of the chain.
    pub fn push(&mut self, pass: Box<dyn PostPass>) {
        log::debug!("Pass ajoutée : {}", pass.name());
        self.passes.push(pass);
    }

    /// Builder form of [`PassChain::push`].
    #[must_use]
    pub fn with(mut self, pass: Box<dyn PostPass>) -> Self {
        self.push(pass);
        self
    }

    /// Mutable access to the pass at `index`, for reconfiguration between frames.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn PostPass>> {
        self.passes.get_mut(index)
    }

    /// Number of passes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// `true` if the chain has no pass.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass in order and return the final image.
    ///
    /// # Errors
    /// Propagates the first pass error.
    pub fn run(&self, input: &FrameBuffer) -> Result<FrameBuffer, CoreError> {
        let mut src = input.clone();
        let mut dst = FrameBuffer::new(input.width, input.height);
        for pass in &self.passes {
            pass.apply(&src, &mut dst)?;
            std::mem::swap(&mut src, &mut dst);
        }
        Ok(src)
    }
}

impl PostPass for PassChain {
    fn apply(&self, input: &FrameBuffer, output: &mut FrameBuffer) -> Result<(), CoreError> {
        if input.width != output.width || input.height != output.height {
            return Err(CoreError::InvalidDimensions {
                width: output.width,
                height: output.height,
            });
        }
        let result = self.run(input)?;
        output.data.copy_from_slice(&result.data);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Negate;

    impl PostPass for Negate {
        fn apply(&self, input: &FrameBuffer, output: &mut FrameBuffer) -> Result<(), CoreError> {
            for (o, i) in output.data.chunks_exact_mut(4).zip(input.data.chunks_exact(4)) {
                o.copy_from_slice(&[255 - i[0], 255 - i[1], 255 - i[2], i[3]]);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "negate"
        }
    }

    struct AddOne;

    impl PostPass for AddOne {
        fn apply(&self, input: &FrameBuffer, output: &mut FrameBuffer) -> Result<(), CoreError> {
            for (o, i) in output.data.iter_mut().zip(&input.data) {
                *o = i.saturating_add(1);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "add_one"
        }
    }

    #[test]
    fn passes_run_in_order() {
        let chain = PassChain::new()
            .with(Box::new(Negate))
            .with(Box::new(AddOne));
        assert_eq!(chain.names(), ["negate", "add_one"]);
        let out = chain.run(&FrameBuffer::filled(2, 2, [10, 20, 30, 40])).unwrap();
        assert_eq!(out.pixel(1, 1), (246, 236, 226, 41));
    }

    #[test]
    fn double_negate_is_identity() {
        let chain = PassChain::new()
            .with(Box::new(Negate))
            .with(Box::new(Negate));
        let input = FrameBuffer::filled(3, 2, [5, 6, 7, 8]);
        assert_eq!(chain.run(&input).unwrap(), input);
    }

    #[test]
    fn chain_is_itself_a_pass() {
        let chain = PassChain::new().with(Box::new(AddOne));
        let input = FrameBuffer::filled(2, 2, [0, 0, 0, 0]);
        let mut output = FrameBuffer::new(2, 2);
        chain.apply(&input, &mut output).unwrap();
        assert!(output.data.iter().all(|&b| b == 1));

        let mut wrong = FrameBuffer::new(1, 2);
        assert!(chain.apply(&input, &mut wrong).is_err());
    }
}
