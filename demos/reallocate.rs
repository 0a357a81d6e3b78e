use reallocator::{ByteBuf, Heap, HeapConfig, diagnostics};

/// Prints every block of the heap in address order.
fn print_heap<A: reallocator::Arena>(
  label: &str,
  heap: &Heap<A>,
) {
  println!(
    "[{}] usage = {} bytes, arena top = {}",
    label,
    heap.usage(),
    heap.arena().top()
  );

  for block in heap.blocks() {
    println!(
      "    block @ {:>5}: padding {}, size {:>4}, {}",
      block.offset,
      block.padding,
      block.size,
      if block.in_use { "in use" } else { "free" }
    );
  }
}

fn main() {
  env_logger::init();

  // Arena size and exhaustion policy can be set through
  // REALLOCATOR_ARENA_SIZE and REALLOCATOR_ON_EXHAUSTION.
  let config = HeapConfig::from_env();
  let Some(mut heap) = Heap::fixed(config) else {
    eprintln!("could not reserve an arena of {} bytes", config.arena_capacity);
    std::process::exit(1);
  };

  // --------------------------------------------------------------------
  // 1) Scripted balanced sequences: usage must come back to zero.
  // --------------------------------------------------------------------
  if let Err(err) = diagnostics::exercise(&mut heap) {
    eprintln!("heap self-test failed: {}", err);
    std::process::exit(1);
  }
  print_heap("after self-test", &heap);

  // --------------------------------------------------------------------
  // 2) A few allocations, then free the first one to leave a hole.
  // --------------------------------------------------------------------
  let sizes = [10, 20, 40];
  let mut ptrs = Vec::new();
  for size in sizes {
    match heap.resize(None, 0, size) {
      Ok(ptr) => ptrs.push(ptr),
      Err(err) => {
        eprintln!("allocation of {} bytes failed: {}", size, err);
        std::process::exit(1);
      }
    }
  }
  print_heap("three blocks", &heap);

  if let Err(err) = heap.resize(ptrs[0], sizes[0], 0) {
    eprintln!("free failed: {}", err);
    std::process::exit(1);
  }
  print_heap("first freed", &heap);

  // --------------------------------------------------------------------
  // 3) A small request lands in the hole.
  // --------------------------------------------------------------------
  let reused = match heap.resize(None, 0, 8) {
    Ok(ptr) => ptr,
    Err(err) => {
      eprintln!("allocation of 8 bytes failed: {}", err);
      std::process::exit(1);
    }
  };
  println!(
    "\n[3] reused the freed block? {}",
    if reused == ptrs[0] { "yes" } else { "no" }
  );
  ptrs[0] = reused;

  // --------------------------------------------------------------------
  // 4) Grow a byte buffer through the heap.
  // --------------------------------------------------------------------
  let mut buf = ByteBuf::new();
  if let Err(err) = buf.extend_from_slice(&mut heap, b"the quick brown fox jumps over the lazy dog") {
    eprintln!("buffer growth failed: {}", err);
    std::process::exit(1);
  }
  println!(
    "\n[4] buffer holds {:?} ({} of {} bytes)",
    String::from_utf8_lossy(buf.as_slice(&heap)),
    buf.len(),
    buf.capacity()
  );
  print_heap("with buffer", &heap);

  // --------------------------------------------------------------------
  // 5) Free everything; the arena is handed back completely.
  // --------------------------------------------------------------------
  if let Err(err) = buf.free(&mut heap) {
    eprintln!("buffer free failed: {}", err);
    std::process::exit(1);
  }
  for (ptr, size) in ptrs.into_iter().zip(sizes) {
    if let Err(err) = heap.resize(ptr, size, 0) {
      eprintln!("free failed: {}", err);
      std::process::exit(1);
    }
  }
  print_heap("all freed", &heap);

  if let Err(err) = heap.verify() {
    eprintln!("block list is inconsistent: {}", err);
    std::process::exit(1);
  }
}
