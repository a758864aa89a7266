use life_engines::*;

const SEED: u64 = 42;

fn main() -> Result<(), StepError> {
    // random soups of growing size, stepped by both algorithms
    let hashlife = HashLifeAlgorithm::new(4 << 10);
    let naive = NaiveAlgorithm::new();
    for size in [16, 64, 256] {
        let soup = CellState::random(size, size, 0.3, Some(SEED));
        println!("size={size}\tpopulation={}", soup.population());

        for generations in [64, 1024] {
            hashlife.run_gc();
            let timer = std::time::Instant::now();
            let expected = naive.step(&soup, &Rule::CONWAY, generations)?;
            let elapsed_naive = timer.elapsed().as_secs_f64();

            let timer = std::time::Instant::now();
            let result = hashlife.step(&soup, &Rule::CONWAY, generations)?;
            let elapsed_hashlife = timer.elapsed().as_secs_f64();

            assert_eq!(result, expected, "algorithms disagree");
            println!(
                "{} -> naive {:.3} secs, hashlife {:.3} secs, cache {} MiB",
                generations,
                elapsed_naive,
                elapsed_hashlife,
                hashlife.bytes_total() >> 20
            );
        }
    }
    Ok(())
}
