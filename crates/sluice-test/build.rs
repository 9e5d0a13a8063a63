fn main() {
    sluice::build!();
}
