//! Tests the move generator against published perft counts
//
//  Copyright 2021 Michael Leany
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////

mod move_gen {
    use chess::variations;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    mod quick {
        use super::*;

        #[test]
        fn startpos() {
            assert_eq!(count(START, 4), 197_281);
        }

        #[test]
        fn kiwipete() {
            assert_eq!(count(KIWIPETE, 1), 48);
            assert_eq!(count(KIWIPETE, 2), 2_039);
            assert_eq!(count(KIWIPETE, 3), 97_862);
        }

        #[test]
        fn position_3() {
            assert_eq!(count(POSITION_3, 1), 14);
            assert_eq!(count(POSITION_3, 4), 43_238);
        }

        #[test]
        fn position_4() {
            assert_eq!(count(POSITION_4, 1), 6);
            assert_eq!(count(POSITION_4, 3), 9_467);
        }

        #[test]
        fn position_5() {
            assert_eq!(count(POSITION_5, 1), 44);
            assert_eq!(count(POSITION_5, 3), 62_379);
        }
    }

    #[test]
    fn position_001() {
        assert_eq!(count(START, 6), 119_060_324);
    }

    #[test]
    fn position_002() {
        assert_eq!(count(KIWIPETE, 5), 193_690_690);
    }

    #[test]
    fn position_003() {
        assert_eq!(count(POSITION_3, 6), 11_030_083);
    }

    #[test]
    fn position_004() {
        assert_eq!(count(POSITION_4, 5), 15_833_292);
    }

    #[test]
    fn position_005() {
        assert_eq!(count(POSITION_5, 5), 89_941_194);
    }

    #[test]
    fn illegal_en_passant_is_rejected() {
        // capturing en passant would expose the king along the rank or file
        assert_eq!(count("3k4/3p4/8/K1P4r/8/8/8/8 b - - 0 1", 6), 1_134_888);
        assert_eq!(count("8/8/4k3/8/2p5/8/B2P2K1/8 w - - 0 1", 6), 1_015_133);
    }

    #[test]
    fn en_passant_capture_gives_check() {
        assert_eq!(count("8/8/1k6/2b5/2pP4/8/5K2/8 b - d3 0 1", 6), 1_440_467);
    }

    #[test]
    fn castling_interactions() {
        // castling gives check
        assert_eq!(count("5k2/8/8/8/8/8/8/4K2R w K - 0 1", 6), 661_072);
        assert_eq!(count("3k4/8/8/8/8/8/8/R3K3 w Q - 0 1", 6), 803_711);
        // castling rights lost to rook captures
        assert_eq!(count("r3k2r/1b4bq/8/8/8/8/7B/R3K2R w KQkq - 0 1", 4), 1_274_206);
        // castling prevented by attacked transit squares
        assert_eq!(count("r3k2r/8/3Q4/8/8/5q2/8/R3K2R b KQkq - 0 1", 4), 1_720_476);
    }

    #[test]
    fn promotions_and_checks() {
        // promote out of check
        assert_eq!(count("2K2r2/4P3/8/8/8/8/8/3k4 w - - 0 1", 6), 3_821_001);
        // discovered check
        assert_eq!(count("8/8/1P2K3/8/2n5/1q6/8/5k2 b - - 0 1", 5), 1_004_658);
        // promote to give check, including underpromotions
        assert_eq!(count("4k3/1P6/8/8/8/8/K7/8 w - - 0 1", 6), 217_342);
        assert_eq!(count("8/P1k5/K7/8/8/8/8/8 w - - 0 1", 6), 92_683);
    }

    #[test]
    fn stalemates_and_double_check() {
        assert_eq!(count("K1k5/8/P7/8/8/8/8/8 w - - 0 1", 6), 2_217);
        assert_eq!(count("8/k1P5/8/1K6/8/8/8/8 w - - 0 1", 7), 567_584);
        assert_eq!(count("8/8/2k5/5q2/5n2/8/5K2/8 b - - 0 1", 4), 23_527);
    }

    fn count(fen: &str, depth: usize) -> u64 {
        println!("\n{}", fen);
        let mut board = fen.parse().unwrap();

        let count = variations::print(&mut board, depth);
        println!("Depth {} total:\t{:12}", depth, count);

        count
    }
}
